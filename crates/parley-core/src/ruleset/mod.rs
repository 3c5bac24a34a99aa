//! Ruleset sources.
//!
//! The engine never reads storage itself; it is handed a [`RulesetSource`].
//! [`FileRulesetSource`] reads JSON, TOML or YAML by file extension and
//! [`StaticRulesetSource`] wraps an in-memory ruleset.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::{ErrorCode, ParleyError, ParleyResult};
use crate::types::Ruleset;

/// Something that can produce a ruleset.
pub trait RulesetSource: Send + Sync {
    /// Load the full ruleset.
    fn load(&self) -> ParleyResult<Ruleset>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Ruleset stored in a file.
#[derive(Debug, Clone)]
pub struct FileRulesetSource {
    path: PathBuf,
}

impl FileRulesetSource {
    /// Create a source for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RulesetSource for FileRulesetSource {
    fn load(&self) -> ParleyResult<Ruleset> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            let message = format!("cannot read {}: {}", self.path.display(), e);
            ParleyError::ruleset_unreadable(message, e)
        })?;
        let ext = self.path.extension().and_then(|e| e.to_str());
        let context = || format!("cannot parse {}", self.path.display());

        let ruleset = match ext {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ParleyError::ruleset_invalid(context(), e))?,
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ParleyError::ruleset_invalid(context(), e))?
            }
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ParleyError::ruleset_invalid(context(), e))?,
            _ => {
                return Err(ParleyError::RulesetLoad {
                    message: format!(
                        "unsupported ruleset format for {}. Use .json, .toml, or .yaml",
                        self.path.display()
                    ),
                    code: ErrorCode::RuleInvalidFormat,
                    source: None,
                })
            }
        };

        Ok(ruleset)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Ruleset held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRulesetSource {
    ruleset: Ruleset,
}

impl StaticRulesetSource {
    /// Wrap a ruleset.
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }
}

impl RulesetSource for StaticRulesetSource {
    fn load(&self) -> ParleyResult<Ruleset> {
        Ok(self.ruleset.clone())
    }

    fn describe(&self) -> String {
        format!("static:{} rules", self.ruleset.rules.len())
    }
}

/// Load from `source`, substituting an empty ruleset on failure.
///
/// With an empty ruleset every query falls through both tiers and the caller's
/// generation/fallback path takes over.
pub fn load_or_empty(source: &dyn RulesetSource) -> Ruleset {
    match source.load() {
        Ok(ruleset) => {
            debug!(source = %source.describe(), rules = ruleset.rules.len(), "Ruleset loaded");
            ruleset
        }
        Err(e) => {
            error!(
                source = %source.describe(),
                code = e.code().as_str(),
                error = %e,
                "Failed to load ruleset, continuing with an empty one"
            );
            Ruleset::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(
            ".json",
            r#"{
                "rules": [{"id": "greeting", "keywords": ["hello"], "response_pool": [{"probability": 0.4, "response": "Hail, traveler."}]}],
                "general_responses": [{"probability": 1.0, "response": "Hm."}]
            }"#,
        );
        let ruleset = FileRulesetSource::new(file.path()).load().unwrap();
        assert_eq!(ruleset.rules[0].id, "greeting");
        assert_eq!(ruleset.general_responses[0].response, "Hm.");
    }

    #[test]
    fn test_load_toml() {
        let file = write_temp(
            ".toml",
            r#"
[[rules]]
id = "farewell"
keywords = ["goodbye", "see you later"]

[[rules.response_pool]]
probability = 1.0
response = "Safe travels."

[[general_responses]]
probability = 1.0
response = "The wind is quiet today."
"#,
        );
        let ruleset = FileRulesetSource::new(file.path()).load().unwrap();
        assert_eq!(ruleset.rules[0].keywords.len(), 2);
        assert_eq!(ruleset.rules[0].response_pool[0].response, "Safe travels.");
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(
            ".yaml",
            "rules:\n  - id: greeting\n    keywords: [hello]\n    response_pool:\n      - probability: 1\n        response: Well met.\n",
        );
        let ruleset = FileRulesetSource::new(file.path()).load().unwrap();
        assert_eq!(ruleset.rules[0].response_pool[0].response, "Well met.");
    }

    #[test]
    fn test_load_errors() {
        let missing = FileRulesetSource::new("/nonexistent/parley/rules.json");
        assert_eq!(missing.load().unwrap_err().code(), ErrorCode::RuleUnreadable);

        let garbled = write_temp(".json", "{ not json");
        assert_eq!(
            FileRulesetSource::new(garbled.path()).load().unwrap_err().code(),
            ErrorCode::RuleInvalidFormat
        );

        let unknown = write_temp(".csv", "id,keywords");
        assert_eq!(
            FileRulesetSource::new(unknown.path()).load().unwrap_err().code(),
            ErrorCode::RuleInvalidFormat
        );
    }

    #[test]
    fn test_load_or_empty_on_failure() {
        let ruleset = load_or_empty(&FileRulesetSource::new("/nonexistent/rules.json"));
        assert!(ruleset.rules.is_empty());
        assert!(ruleset.general_responses.is_empty());
    }
}
