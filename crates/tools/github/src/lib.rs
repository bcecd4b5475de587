//! GitHub Releases feed for utile.
//!
//! Fetches the latest release of a repository through the GitHub REST API and
//! downloads single-file release assets. All requests are blocking and one-shot.

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;
use utile_core::tools::{ReleaseAsset, ReleaseFeed, ReleaseMetadata};
use utile_core::{Error, Result};

/// Default GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable overriding the API endpoint (e.g. for GitHub Enterprise).
pub const API_URL_ENV: &str = "UTILE_GITHUB_API";

/// GitHub release metadata from the API.
#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
    assets: Vec<Asset>,
}

/// GitHub release asset.
#[derive(Debug, Deserialize)]
struct Asset {
    browser_download_url: String,
}

/// Release feed backed by a GitHub repository's releases.
pub struct GitHubReleaseFeed {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubReleaseFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubReleaseFeed")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubReleaseFeed {
    /// Create a feed for `owner/repo`.
    ///
    /// The API endpoint comes from `UTILE_GITHUB_API` when set, and a token from
    /// `GITHUB_TOKEN` or `GH_TOKEN` is sent to raise rate limits.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("utile/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;

        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            client,
            api_url,
            owner: owner.into(),
            repo: repo.into(),
            token,
        })
    }

    /// Feed for Cloudflare's `cloudflared` releases.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn cloudflared() -> Result<Self> {
        Self::new("cloudflare", "cloudflared")
    }

    /// Use a different API endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// URL of the latest-release endpoint.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) if self.sends_token_to(url) => {
                request.header("Authorization", format!("Bearer {token}"))
            }
            _ => request,
        }
    }

    /// The token only goes to the configured API endpoint and GitHub's own hosts.
    fn sends_token_to(&self, url: &str) -> bool {
        if url.starts_with(self.api_url.trim_end_matches('/')) {
            return true;
        }
        reqwest::Url::parse(url).is_ok_and(|parsed| {
            parsed.scheme() == "https"
                && parsed
                    .host_str()
                    .is_some_and(|host| host == "github.com" || host.ends_with(".github.com"))
        })
    }
}

impl ReleaseFeed for GitHubReleaseFeed {
    fn name(&self) -> &'static str {
        "github"
    }

    fn fetch_latest_release(&self) -> Result<ReleaseMetadata> {
        let url = self.latest_release_url();
        debug!(%url, "Fetching latest GitHub release");

        let response = self
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| Error::feed_unreachable(&url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedRequest {
                url,
                status_code: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| Error::feed_unreachable(&url, e.to_string()))?;
        let release = parse_release(&body).map_err(|e| Error::feed_malformed(&url, e.to_string()))?;

        debug!(version = %release.version, assets = release.assets.len(), "Fetched GitHub release");
        Ok(release)
    }

    fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>> {
        let url = &asset.download_url;
        debug!(%url, "Downloading GitHub asset");

        let response = self
            .get(url)
            .send()
            .map_err(|e| Error::asset_download(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::asset_download(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Error::asset_download(url, e.to_string()))
    }
}

/// Parse a GitHub release document.
///
/// The release `name` is the version identifier, with `tag_name` as fallback when
/// the name is missing or blank.
fn parse_release(body: &str) -> serde_json::Result<ReleaseMetadata> {
    let release: Release = serde_json::from_str(body)?;

    let version = release
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or(release.tag_name);

    Ok(ReleaseMetadata {
        version,
        assets: release
            .assets
            .into_iter()
            .map(|a| ReleaseAsset::from_url(a.browser_download_url))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    const RELEASE_JSON: &str = r#"{
        "tag_name": "2024.12.2",
        "name": "2024.12.2",
        "assets": [
            {
                "name": "cloudflared-linux-amd64",
                "browser_download_url": "https://github.com/cloudflare/cloudflared/releases/download/2024.12.2/cloudflared-linux-amd64"
            },
            {
                "name": "cloudflared-windows-amd64.exe",
                "browser_download_url": "https://github.com/cloudflare/cloudflared/releases/download/2024.12.2/cloudflared-windows-amd64.exe"
            }
        ]
    }"#;

    /// Serve a single canned HTTP response on a local port and return its base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        serve_once_capturing(status, body).0
    }

    /// Like [`serve_once`], also handing back the raw request head.
    fn serve_once_capturing(
        status: &'static str,
        body: &'static str,
    ) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                head.push_str(&line);
                line.clear();
            }
            let _ = tx.send(head);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        (format!("http://{addr}"), rx)
    }

    fn feed(api_url: &str) -> GitHubReleaseFeed {
        GitHubReleaseFeed::cloudflared()
            .unwrap()
            .with_api_url(api_url)
            .with_token(None)
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(feed(DEFAULT_API_URL).name(), "github");
    }

    #[test]
    fn test_latest_release_url() {
        assert_eq!(
            feed("https://api.github.com/").latest_release_url(),
            "https://api.github.com/repos/cloudflare/cloudflared/releases/latest"
        );
    }

    #[test]
    fn test_api_url_env_override() {
        temp_env::with_var(API_URL_ENV, Some("https://ghe.example.com/api/v3"), || {
            let feed = GitHubReleaseFeed::new("cloudflare", "cloudflared").unwrap();
            assert_eq!(
                feed.latest_release_url(),
                "https://ghe.example.com/api/v3/repos/cloudflare/cloudflared/releases/latest"
            );
        });
    }

    #[test]
    fn test_debug_redacts_token() {
        let feed = feed(DEFAULT_API_URL).with_token(Some("secret-token".into()));
        let debug = format!("{feed:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_token_scope() {
        let feed = feed("https://ghe.example.com/api/v3").with_token(Some("t".into()));

        assert!(feed.sends_token_to("https://ghe.example.com/api/v3/repos/cloudflare/cloudflared/releases/latest"));
        assert!(feed.sends_token_to(
            "https://github.com/cloudflare/cloudflared/releases/download/2024.12.2/cloudflared-linux-amd64"
        ));
        assert!(feed.sends_token_to("https://api.github.com/repos/cloudflare/cloudflared"));

        assert!(!feed.sends_token_to("https://mirror.example.com/cloudflared-linux-amd64"));
        assert!(!feed.sends_token_to("https://github.com.evil.example/cloudflared-linux-amd64"));
        assert!(!feed.sends_token_to("http://github.com/cloudflared-linux-amd64"));
        assert!(!feed.sends_token_to("not a url"));
    }

    #[test]
    fn test_download_from_foreign_host_omits_token() {
        let (url, request) = serve_once_capturing("200 OK", "binary-bytes");
        let asset = ReleaseAsset::from_url(format!("{url}/cloudflared-linux-amd64"));
        let feed = feed(DEFAULT_API_URL).with_token(Some("secret-token".into()));

        feed.download_asset(&asset).unwrap();

        let request = request.recv().unwrap().to_lowercase();
        assert!(!request.contains("authorization"));
        assert!(!request.contains("secret-token"));
    }

    #[test]
    fn test_api_request_carries_token() {
        let (url, request) = serve_once_capturing("200 OK", RELEASE_JSON);
        let feed = feed(&url).with_token(Some("secret-token".into()));

        feed.fetch_latest_release().unwrap();

        let request = request.recv().unwrap();
        assert!(request.contains("Bearer secret-token"));
    }

    #[test]
    fn test_parse_release() {
        let release = parse_release(RELEASE_JSON).unwrap();
        assert_eq!(release.version, "2024.12.2");
        assert_eq!(release.major_version(), 2024);
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[0].filename, "cloudflared-linux-amd64");
        assert_eq!(release.assets[1].extension, "exe");
    }

    #[test]
    fn test_parse_release_falls_back_to_tag() {
        let release =
            parse_release(r#"{"tag_name": "1.2.3", "name": null, "assets": []}"#).unwrap();
        assert_eq!(release.version, "1.2.3");

        let release = parse_release(r#"{"tag_name": "1.2.3", "name": "  ", "assets": []}"#).unwrap();
        assert_eq!(release.version, "1.2.3");
    }

    #[test]
    fn test_parse_release_malformed() {
        assert!(parse_release("<html>rate limited</html>").is_err());
        assert!(parse_release(r#"{"name": "1.0.0"}"#).is_err());
    }

    #[test]
    fn test_fetch_latest_release() {
        let url = serve_once("200 OK", RELEASE_JSON);
        let release = feed(&url).fetch_latest_release().unwrap();
        assert_eq!(release.version, "2024.12.2");
        assert_eq!(release.assets.len(), 2);
    }

    #[test]
    fn test_fetch_non_success_status() {
        let url = serve_once("403 Forbidden", r#"{"message": "API rate limit exceeded"}"#);
        let err = feed(&url).fetch_latest_release().unwrap_err();
        assert!(matches!(err, Error::FeedRequest { status_code: 403, .. }));
    }

    #[test]
    fn test_fetch_malformed_body() {
        let url = serve_once("200 OK", "not json");
        let err = feed(&url).fetch_latest_release().unwrap_err();
        assert!(matches!(err, Error::FeedResponseMalformed { .. }));
    }

    #[test]
    fn test_fetch_unreachable() {
        // Bind then drop to get a local port with nothing listening
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = feed(&format!("http://{addr}")).fetch_latest_release().unwrap_err();
        assert!(matches!(err, Error::FeedUnreachable { .. }));
    }

    #[test]
    fn test_download_asset() {
        let url = serve_once("200 OK", "binary-bytes");
        let asset = ReleaseAsset::from_url(format!("{url}/cloudflared-linux-amd64"));
        let bytes = feed(DEFAULT_API_URL).download_asset(&asset).unwrap();
        assert_eq!(bytes, b"binary-bytes");
    }

    #[test]
    fn test_download_asset_not_found() {
        let url = serve_once("404 Not Found", "");
        let asset = ReleaseAsset::from_url(format!("{url}/cloudflared-linux-amd64"));
        let err = feed(DEFAULT_API_URL).download_asset(&asset).unwrap_err();
        assert!(matches!(err, Error::AssetDownload { ref message, .. } if message.contains("404")));
    }
}
