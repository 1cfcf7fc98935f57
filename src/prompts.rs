use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

const DEFAULT_EXTRACT_SYSTEM: &str = include_str!("default_prompts/extract-system.md");
const DEFAULT_EXTRACT_USER: &str = include_str!("default_prompts/extract-user.md");
const DEFAULT_CONSOLIDATE_SYSTEM: &str = include_str!("default_prompts/consolidate-system.md");
const DEFAULT_CONSOLIDATE_USER: &str = include_str!("default_prompts/consolidate-user.md");
const DEFAULT_RELEVANCE_SYSTEM: &str = include_str!("default_prompts/relevance-system.md");
const DEFAULT_RELEVANCE_USER: &str = include_str!("default_prompts/relevance-user.md");
const DEFAULT_FLAG_DETECT_SYSTEM: &str = include_str!("default_prompts/flag-detect-system.md");
const DEFAULT_FLAG_DETECT_USER: &str = include_str!("default_prompts/flag-detect-user.md");
const DEFAULT_FLAG_SCORE_SYSTEM: &str = include_str!("default_prompts/flag-score-system.md");
const DEFAULT_FLAG_SCORE_USER: &str = include_str!("default_prompts/flag-score-user.md");
const DEFAULT_FLAG_DETAILS_SYSTEM: &str = include_str!("default_prompts/flag-details-system.md");
const DEFAULT_FLAG_DETAILS_USER: &str = include_str!("default_prompts/flag-details-user.md");
const DEFAULT_REFORMULATE: &str = include_str!("default_prompts/reformulate.md");

fn default_template(name: &str) -> Option<&'static str> {
    match name {
        "extract-system" => Some(DEFAULT_EXTRACT_SYSTEM),
        "extract-user" => Some(DEFAULT_EXTRACT_USER),
        "consolidate-system" => Some(DEFAULT_CONSOLIDATE_SYSTEM),
        "consolidate-user" => Some(DEFAULT_CONSOLIDATE_USER),
        "relevance-system" => Some(DEFAULT_RELEVANCE_SYSTEM),
        "relevance-user" => Some(DEFAULT_RELEVANCE_USER),
        "flag-detect-system" => Some(DEFAULT_FLAG_DETECT_SYSTEM),
        "flag-detect-user" => Some(DEFAULT_FLAG_DETECT_USER),
        "flag-score-system" => Some(DEFAULT_FLAG_SCORE_SYSTEM),
        "flag-score-user" => Some(DEFAULT_FLAG_SCORE_USER),
        "flag-details-system" => Some(DEFAULT_FLAG_DETAILS_SYSTEM),
        "flag-details-user" => Some(DEFAULT_FLAG_DETAILS_USER),
        "reformulate" => Some(DEFAULT_REFORMULATE),
        _ => None,
    }
}

fn template_filename(name: &str) -> String {
    format!("{name}.md")
}

/// Prompt template engine with embedded defaults and per-file user overrides.
///
/// Templates use `upon` syntax (`{{ review }}`). Rendering is strict: a
/// variable the context does not provide is an error.
pub struct PromptEngine {
    override_dir: Option<PathBuf>,
    engine: upon::Engine<'static>,
}

impl PromptEngine {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            engine: upon::Engine::new(),
        }
    }

    /// Load a prompt template by name.
    /// User overrides in `override_dir` take precedence over defaults.
    pub fn load_template(&self, name: &str) -> Result<String> {
        let default = default_template(name)
            .ok_or_else(|| Error::Prompt(format!("unknown prompt template: {name}")))?;

        if let Some(ref dir) = self.override_dir {
            let path = Path::new(dir).join(template_filename(name));
            if path.exists() {
                return std::fs::read_to_string(&path).map_err(|e| {
                    Error::Prompt(format!(
                        "failed to read override template {}: {e}",
                        path.display()
                    ))
                });
            }
        }

        Ok(default.to_string())
    }

    /// Load a template and render it against `ctx`. Surrounding whitespace is trimmed.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let source = self.load_template(name)?;
        let template = self
            .engine
            .compile(source)
            .map_err(|e| Error::Prompt(format!("failed to compile template {name}: {e}")))?;
        let rendered = template
            .render(&self.engine, ctx)
            .to_string()
            .map_err(|e| Error::Prompt(format!("failed to render template {name}: {e}")))?;
        Ok(rendered.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_extract() {
        let engine = PromptEngine::new(None);
        let template = engine.load_template("extract-system").unwrap();
        assert!(template.contains("Identify 2-4 main themes"));
        assert!(template.contains("{{ focus_areas }}"));
    }

    #[test]
    fn test_load_unknown_template() {
        let engine = PromptEngine::new(None);
        let err = engine.load_template("summarize").unwrap_err();
        assert!(err.to_string().contains("unknown prompt template"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("relevance-user.md"),
            "Theme {{ theme }} vs {{ review }}",
        )
        .unwrap();

        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        let rendered = engine
            .render(
                "relevance-user",
                serde_json::json!({ "review": "Slow delivery", "theme": "delivery experience" }),
            )
            .unwrap();
        assert_eq!(rendered, "Theme delivery experience vs Slow delivery");
    }

    #[test]
    fn test_override_fallback_to_default() {
        let dir = TempDir::new().unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        let template = engine.load_template("consolidate-system").unwrap();
        assert!(template.contains("groups similar themes together"));
    }

    #[test]
    fn test_override_cannot_add_unknown_template() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("custom.md"), "anything").unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        assert!(engine.load_template("custom").is_err());
    }

    #[test]
    fn test_render_substitutes_and_trims() {
        let engine = PromptEngine::new(None);
        let rendered = engine
            .render("extract-user", serde_json::json!({ "review": "Great support team!" }))
            .unwrap();
        assert_eq!(
            rendered,
            "Review: Great support team!\n\nIdentify the main themes in this review."
        );
    }

    #[test]
    fn test_render_missing_variable_errors() {
        let engine = PromptEngine::new(None);
        let err = engine
            .render("relevance-user", serde_json::json!({ "review": "fine" }))
            .unwrap_err();
        assert!(err.to_string().contains("failed to render template relevance-user"));
    }

    #[test]
    fn test_render_value_is_not_reinterpreted() {
        let engine = PromptEngine::new(None);
        let rendered = engine
            .render("extract-user", serde_json::json!({ "review": "literal {{ braces }}" }))
            .unwrap();
        assert!(rendered.contains("literal {{ braces }}"));
    }

    #[test]
    fn test_every_default_template_compiles() {
        let engine = upon::Engine::new();
        for name in [
            "extract-system",
            "extract-user",
            "consolidate-system",
            "consolidate-user",
            "relevance-system",
            "relevance-user",
            "flag-detect-system",
            "flag-detect-user",
            "flag-score-system",
            "flag-score-user",
            "flag-details-system",
            "flag-details-user",
            "reformulate",
        ] {
            let source = default_template(name).unwrap();
            assert!(engine.compile(source).is_ok(), "template {name} failed to compile");
        }
    }
}
