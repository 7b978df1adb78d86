//! Global configuration settings
//!
//! Process-wide values used while enriching records.

use serde::Deserialize;

/// Machine name used when neither config nor environment provide one
const DEFAULT_MACHINE_NAME: &str = "localhost";

/// Global configuration that applies to all components
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Name stamped on records that do not carry a machine name
    /// Default: HOSTNAME / COMPUTERNAME environment variable, else "localhost"
    pub machine_name: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            machine_name: detect_machine_name(),
        }
    }
}

/// Read the host name from the environment
fn detect_machine_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_MACHINE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_machine_name_not_empty() {
        let config = GlobalConfig::default();
        assert!(!config.machine_name.is_empty());
    }

    #[test]
    fn test_deserialize_machine_name() {
        let config: GlobalConfig = toml::from_str("machine_name = \"web-02\"").unwrap();
        assert_eq!(config.machine_name, "web-02");
    }
}
