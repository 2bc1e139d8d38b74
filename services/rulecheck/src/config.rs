use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use crate::rules::detector::{Check, DetectorConfig};
use crate::rules::naming::NamingConfig;
use crate::rules::outputs::ReportFormat;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub self_contradictions: bool,
    #[serde(default = "default_true")]
    pub literal_contradictions: bool,
    #[serde(default = "default_true")]
    pub cross_rule_conflicts: bool,
    #[serde(default = "default_true")]
    pub redundant_rules: bool,
    #[serde(default = "default_true")]
    pub formula_aliases: bool,
    #[serde(default = "default_false")]
    pub similar_names: bool,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            self_contradictions: default_true(),
            literal_contradictions: default_true(),
            cross_rule_conflicts: default_true(),
            redundant_rules: default_true(),
            formula_aliases: default_true(),
            similar_names: default_false(),
        }
    }
}

impl ChecksConfig {
    pub fn is_enabled(&self, check: Check) -> bool {
        match check {
            Check::SelfContradictions => self.self_contradictions,
            Check::LiteralContradictions => self.literal_contradictions,
            Check::CrossRuleConflicts => self.cross_rule_conflicts,
            Check::RedundantRules => self.redundant_rules,
            Check::FormulaAliases => self.formula_aliases,
            Check::SimilarNames => self.similar_names,
        }
    }

    pub fn enabled(&self) -> Vec<Check> {
        Check::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            checks: self.checks.enabled(),
            naming: self.naming.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
