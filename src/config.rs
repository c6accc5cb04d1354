use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AnalyzerError, Result};

pub const DEFAULT_TARGET_SITES: [&str; 23] = [
    "NANT", "BLCK", "AMAG", "MRCH", "HEMP", "HOOK", "LOVE", "BRIG", "WILD", "SILD", "OLDB",
    "PORT", "CAPE", "LEWE", "HLPN", "SEAB", "BRAD", "SPRK", "HLGT", "BRMR", "RATH", "WOOD",
    "CMPT",
];

/// Which sites the report must always cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    target_sites: Vec<String>,
}

#[derive(Deserialize)]
struct ConfigFile {
    target_sites: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            target_sites: DEFAULT_TARGET_SITES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalyzerConfig {
    /// Builds a config from site codes, trimming and dropping blanks and repeats.
    pub fn with_sites<I, S>(sites: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let target_sites: Vec<String> = sites
            .into_iter()
            .map(|site| site.as_ref().trim().to_string())
            .filter(|site| !site.is_empty())
            .filter(|site| seen.insert(site.clone()))
            .collect();

        if target_sites.is_empty() {
            return Err(AnalyzerError::Config(
                "at least one target site is required".to_string(),
            ));
        }

        Ok(Self { target_sites })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(raw).map_err(|e| AnalyzerError::Config(e.to_string()))?;
        Self::with_sites(file.target_sites)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn target_sites(&self) -> &[String] {
        &self.target_sites
    }

    pub fn is_target(&self, site: &str) -> bool {
        self.target_sites.iter().any(|target| target == site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_all_sites() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.target_sites().len(), 23);
        assert!(config.is_target("NANT"));
        assert!(config.is_target("CMPT"));
        assert!(!config.is_target("nant"));
    }

    #[test]
    fn sites_are_trimmed_and_deduplicated_in_order() {
        let config = AnalyzerConfig::with_sites([" WOOD", "AMAG", "", "WOOD "]).unwrap();
        assert_eq!(config.target_sites(), &["WOOD".to_string(), "AMAG".to_string()]);
    }

    #[test]
    fn empty_site_list_is_rejected() {
        let err = AnalyzerConfig::with_sites(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    #[test]
    fn loads_sites_from_json() {
        let config = AnalyzerConfig::from_json_str(r#"{"target_sites": ["HOOK", "LOVE"]}"#)
            .unwrap();
        assert_eq!(config.target_sites(), &["HOOK".to_string(), "LOVE".to_string()]);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = AnalyzerConfig::from_json_str(r#"{"sites": "HOOK"}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
