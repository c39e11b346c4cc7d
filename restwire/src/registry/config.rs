use restwire_core::WiringError;
use serde::{Deserialize, Serialize};

/// Start-up configuration of the client registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Module paths to scan for client traits, e.g. `"shop::clients"`.
    #[serde(default)]
    pub base_packages: Vec<String>,
}

impl RegistryConfig {
    pub fn new<I, S>(base_packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base_packages: base_packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_json(source: &str) -> Result<Self, WiringError> {
        serde_json::from_str(source)
            .map_err(|e| WiringError::Configuration(format!("invalid registry config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_base_packages() {
        let config = RegistryConfig::from_json(r#"{"base_packages": ["shop::clients"]}"#).unwrap();
        assert_eq!(config, RegistryConfig::new(["shop::clients"]));
    }

    #[test]
    fn missing_list_reads_as_empty() {
        assert!(RegistryConfig::from_json("{}").unwrap().base_packages.is_empty());
        assert!(matches!(
            RegistryConfig::from_json("[1, 2]"),
            Err(WiringError::Configuration(_))
        ));
    }
}
