use tracing::instrument;

#[instrument]
pub fn get_version_info() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let description = env!("CARGO_PKG_DESCRIPTION");

    tracing::debug!(
        package_name = name,
        package_version = version,
        "Gathering package information"
    );

    let platform = utile_core::tools::describe_platform()
        .map_or_else(|_| "unknown".to_string(), |p| p.to_string());
    let cache_root = utile_core::paths::cache_dir()
        .map_or_else(|_| "unknown".to_string(), |p| p.display().to_string());

    format!(
        "{name} {version} - {description}\n\
        Platform: {platform}\n\
        Cache: {cache_root}\n\
        Correlation ID: {}",
        crate::tracing::correlation_id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version_info_format() {
        let version_info = get_version_info();

        assert!(version_info.starts_with("utile-cli "));
        assert!(version_info.contains(env!("CARGO_PKG_VERSION")));
        assert!(version_info.contains("Platform:"));
        assert!(version_info.contains("Cache:"));
        assert!(version_info.contains("Correlation ID:"));
    }

    #[test]
    fn test_get_version_info_correlation_id_format() {
        let version_info = get_version_info();

        let correlation_line = version_info
            .lines()
            .find(|line| line.starts_with("Correlation ID:"))
            .expect("Should contain correlation ID");

        let uuid_part = correlation_line.trim_start_matches("Correlation ID:").trim();
        assert_eq!(uuid_part.len(), 36);
        assert_eq!(uuid_part, crate::tracing::correlation_id().to_string());
    }
}
