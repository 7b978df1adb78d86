//! Per-site overrides

use serde::Deserialize;

/// Overrides for one site
///
/// ```toml
/// [[sites]]
/// id = 5
/// name = "shop"
/// log_size = 50
/// keep_percent = 20
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Numeric site id (must be non-zero)
    pub id: u32,

    /// Display name passed to the notification collaborator
    pub name: Option<String>,

    /// Overrides `event_log.log_size`
    pub log_size: Option<u64>,

    /// Overrides `event_log.keep_percent`
    pub keep_percent: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let config: SiteConfig = toml::from_str("id = 3").unwrap();
        assert_eq!(config.id, 3);
        assert!(config.name.is_none());
        assert!(config.log_size.is_none());
        assert!(config.keep_percent.is_none());
    }
}
