//! Result message templates and placeholder substitution.

use crate::ApplicationResult;
use config::{Config, File, FileFormat};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};
use tribune_error::{ConfigError, WorkflowError, WorkflowErrorKind, WorkflowResult};

/// Replace every `[PLACEHOLDER]` occurrence with its value, in order.
///
/// # Example
///
/// ```
/// use tribune_workflow::fill;
///
/// let text = fill("Hi <@[APPLICANT_ID]>", &[("[APPLICANT_ID]", "42")]);
/// assert_eq!(text, "Hi <@42>");
/// ```
pub fn fill(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
}

/// Decision section → message type → literal message.
///
/// Sections and keys are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTemplates {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ResultTemplates {
    /// Load templates from a TOML, INI or JSON file (format follows the extension).
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or is not a two-level table of strings.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let builder = Config::builder().add_source(File::from(path));
        let templates = Self::deserialize(builder, &path.display().to_string())?;
        debug!(sections = templates.sections.len(), "Loaded result templates");
        Ok(templates)
    }

    /// Parse templates from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(text, FileFormat::Toml));
        Self::deserialize(builder, "inline templates")
    }

    fn deserialize(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        origin: &str,
    ) -> Result<Self, ConfigError> {
        let sections: HashMap<String, HashMap<String, String>> = builder
            .build()
            .map_err(|e| {
                ConfigError::new(format!("Failed to read result templates from {}: {}", origin, e))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse result templates: {}", e)))?;

        Ok(Self::from_sections(sections))
    }

    /// Build from an in-memory table.
    pub fn from_sections(sections: HashMap<String, HashMap<String, String>>) -> Self {
        let sections = sections
            .into_iter()
            .map(|(decision, messages)| {
                let messages = messages
                    .into_iter()
                    .map(|(kind, text)| (kind.to_lowercase(), text))
                    .collect();
                (decision.to_lowercase(), messages)
            })
            .collect();
        Self { sections }
    }

    /// The message for a result token.
    ///
    /// # Errors
    ///
    /// [`WorkflowErrorKind::UnknownTemplate`] when either level is missing.
    pub fn lookup(&self, result: &ApplicationResult) -> WorkflowResult<&str> {
        let decision: &str = result.decision().as_ref();
        self.sections
            .get(decision)
            .and_then(|messages| messages.get(&result.message_type().to_lowercase()))
            .map(String::as_str)
            .ok_or_else(|| {
                WorkflowError::new(WorkflowErrorKind::UnknownTemplate {
                    decision: decision.to_string(),
                    message_type: result.message_type().clone(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decision;

    const TEMPLATES: &str = r#"
[accept]
standard = "Welcome aboard!"

[deny]
standard = "Not this time."
Inactive = "We could not reach you."
"#;

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let text = fill(
            "[A] and [A] then [B]",
            &[("[A]", "x"), ("[B]", "y")],
        );
        assert_eq!(text, "x and x then y");
    }

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        assert_eq!(fill("[GUILD]", &[("[THREAD_ID]", "1")]), "[GUILD]");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let templates = ResultTemplates::from_toml(TEMPLATES).unwrap();
        let result = ApplicationResult::new(Decision::Deny, "INACTIVE");
        assert_eq!(templates.lookup(&result).unwrap(), "We could not reach you.");
    }

    #[test]
    fn test_missing_template() {
        let templates = ResultTemplates::from_toml(TEMPLATES).unwrap();
        let err = templates
            .lookup(&ApplicationResult::new(Decision::Reject, "standard"))
            .unwrap_err();
        assert!(matches!(err.kind(), WorkflowErrorKind::UnknownTemplate { .. }));
    }

    #[test]
    fn test_load_from_ini_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result_options.ini");
        std::fs::write(&path, "[accept]\nstandard = Welcome!\n").unwrap();

        let templates = ResultTemplates::load(&path).unwrap();
        let result = ApplicationResult::new(Decision::Accept, "standard");
        assert_eq!(templates.lookup(&result).unwrap(), "Welcome!");
    }
}
