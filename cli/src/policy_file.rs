//! Local policy files for `warden evaluate`: TOML or JSON, chosen by extension.
//!
//! ```toml
//! [[capabilities]]
//! name = "shell_exec"
//! default_risk = "high"
//!
//! [[policies]]
//! id = "p1"
//! role = "Developer"
//! cap = "shell_exec"
//! effect = "require_approval"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use warden::{Capability, CapabilityName, Policy, RiskLevel, ValidationError};

#[derive(Debug, Error)]
pub enum PolicyFileError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl PolicyFile {
    pub fn parse_toml(text: &str) -> Result<Self, PolicyFileError> {
        let file: PolicyFile = toml::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    pub fn parse_json(text: &str) -> Result<Self, PolicyFileError> {
        let file: PolicyFile = serde_json::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    /// `.json` files are read as JSON; anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, PolicyFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyFileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::parse_json(&text),
            _ => Self::parse_toml(&text),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.policies.iter().try_for_each(Policy::validate)
    }

    /// Registered default risk; unregistered capabilities are `high`.
    pub fn risk_of(&self, capability: CapabilityName) -> RiskLevel {
        self.capabilities
            .iter()
            .find(|c| c.name == capability)
            .map(|c| c.default_risk)
            .unwrap_or(RiskLevel::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use warden::{PolicyEffect, Selector};

    const TOML: &str = r#"
[[capabilities]]
name = "docs_read"
default_risk = "low"

[[policies]]
id = "p1"
role = "Developer"
cap = "shell_exec"
effect = "require_approval"

[[policies]]
id = "p2"
role = "*"
capability = "*"
effect = "deny"
"#;

    #[test]
    fn parses_toml_with_wildcards() {
        let file = PolicyFile::parse_toml(TOML).unwrap();
        assert_eq!(file.policies.len(), 2);
        assert_eq!(file.policies[0].capability, Selector::Exact(CapabilityName::ShellExec));
        assert_eq!(file.policies[1].role, Selector::Any);
        assert_eq!(file.policies[1].effect, PolicyEffect::Deny);
        assert_eq!(file.risk_of(CapabilityName::DocsRead), RiskLevel::Low);
        assert_eq!(file.risk_of(CapabilityName::ShellExec), RiskLevel::High);
    }

    #[test]
    fn unknown_capability_is_rejected() {
        let err = PolicyFile::parse_json(
            r#"{"policies":[{"id":"p","role":"*","cap":"teleport","effect":"deny"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn empty_policy_id_is_invalid() {
        let err = PolicyFile::parse_json(
            r#"{"policies":[{"id":" ","role":"*","cap":"*","effect":"deny"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyFileError::Invalid(ValidationError::Empty(_))));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("policies.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(
                br#"{"policies":[
                    {"id":"p","role":"QA","cap":"web_search","effect":"auto_approve"}
                ]}"#,
            )
            .unwrap();
        assert_eq!(PolicyFile::load(&json_path).unwrap().policies[0].id, "p");

        let toml_path = dir.path().join("policies.toml");
        std::fs::write(&toml_path, TOML).unwrap();
        assert_eq!(PolicyFile::load(&toml_path).unwrap().policies.len(), 2);

        let missing = PolicyFile::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, PolicyFileError::Read { .. }));
    }
}
