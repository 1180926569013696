//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `guigen.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use guigen::{
    GeneratorConfig, IndentStyle, LineEnding, RewriteGroup, Rewriter, SchemaRoot, Section,
    SectionOrder, Target,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "guigen.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration.
    pub output: OutputConfig,

    /// Declaration emission.
    pub emit: EmitConfig,

    /// Top-level schema type fallbacks.
    pub schema: SchemaConfig,

    /// Post-generation rewriter.
    pub rewrite: RewriteConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target language backend.
    pub target: Target,

    /// Version marker; the schema's own version is used when unset.
    pub version: Option<String>,

    /// Whether to render descriptions as docstrings / JSDoc.
    pub generate_docs: bool,

    /// Indentation ("2", "4" or "tab"); the target's default when unset.
    pub indent: Option<IndentStyle>,

    /// Line endings ("lf" or "crlf").
    pub line_ending: LineEnding,
}

/// Emission configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Section order; every section exactly once.
    pub sections: Vec<String>,

    /// Emit the reject-unknown-fields directive on strict records.
    pub forbid_extra: bool,

    /// Type tuple-list aliases as lists of the matching binding record.
    pub binding_records: bool,
}

/// Fallbacks for the top-level schema type.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name of the generated top-level type.
    pub name: String,

    /// Definition referenced by `metadata`.
    pub metadata_type: String,

    /// Definition referenced by `root`.
    pub root_type: String,
}

/// Rewriter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Log wrapper idioms that are not found at `warn` level.
    pub warn_on_missing: bool,

    /// Wrapper classes to replace by union aliases.
    pub groups: Vec<RewriteGroup>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target: Target::Pydantic,
            version: None,
            generate_docs: true,
            indent: None,
            line_ending: LineEnding::Lf,
        }
    }
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            sections: Section::ALL.iter().map(|s| s.tag().to_string()).collect(),
            forbid_extra: false,
            binding_records: true,
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let root = SchemaRoot::default();
        Self {
            name: root.name,
            metadata_type: root.metadata_type,
            root_type: root.root_type,
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            warn_on_missing: true,
            groups: RewriteGroup::defaults(),
        }
    }
}

impl Config {
    /// Generator options for this configuration.
    pub fn to_generator_config(&self) -> Result<GeneratorConfig, ConfigError> {
        let sections = SectionOrder::parse(self.emit.sections.as_slice())
            .map_err(|e| ConfigError::invalid_value("emit.sections", e.to_string()))?;

        let mut config = GeneratorConfig::new()
            .with_generate_docs(self.output.generate_docs)
            .with_line_ending(self.output.line_ending)
            .with_sections(sections)
            .with_forbid_extra(self.emit.forbid_extra)
            .with_binding_records(self.emit.binding_records);
        if let Some(version) = &self.output.version {
            config = config.with_version(version.clone());
        }
        if let Some(indent) = self.output.indent {
            config = config.with_indent(indent);
        }
        Ok(config)
    }

    /// Top-level type description used where the document is silent.
    pub fn schema_root_fallback(&self) -> SchemaRoot {
        SchemaRoot {
            name: self.schema.name.clone(),
            metadata_type: self.schema.metadata_type.clone(),
            root_type: self.schema.root_type.clone(),
            ..SchemaRoot::default()
        }
    }

    /// Rewriter for the configured groups.
    pub fn to_rewriter(&self) -> Result<Rewriter, ConfigError> {
        if let Some(group) = self.rewrite.groups.iter().find(|g| g.members.is_empty()) {
            return Err(ConfigError::invalid_value(
                "rewrite.groups",
                format!("group '{}' has no members", group.name),
            ));
        }
        Ok(Rewriter::new(self.rewrite.groups.clone()).with_warn_on_missing(self.rewrite.warn_on_missing))
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// An explicit path must exist. Without one, `guigen.toml` in the
    /// current directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::not_found(path.to_path_buf()).into());
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        if !config_path.exists() {
            tracing::debug!("no configuration file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path.clone(), e.to_string()))?;

        tracing::debug!(path = %config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(target) = args.target {
            config.output.target = target;
        }

        if let Some(ref version) = args.version {
            config.output.version = Some(version.clone());
        }

        if let Some(generate_docs) = args.generate_docs {
            config.output.generate_docs = generate_docs;
        }

        if let Some(forbid_extra) = args.forbid_extra {
            config.emit.forbid_extra = forbid_extra;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# guigen configuration file

[output]
# Target backend: "pydantic" or "zod"
target = "pydantic"

# Version marker written into the generated header (defaults to the schema's version)
# version = "1.0.0"

# Render schema descriptions as docstrings / JSDoc comments
generate_docs = true

# Indentation: "2", "4" or "tab" (defaults to 4 for pydantic, 2 for zod)
# indent = "4"

# Line endings: "lf" or "crlf"
line_ending = "lf"

[emit]
# Section order; dependencies always come first
sections = ["enums", "actions", "props", "unions", "components", "schema"]

# Emit extra="forbid" / .strict() on records with additionalProperties: false
forbid_extra = false

# Type [eventType, action] tuple lists as lists of the matching binding record
binding_records = true

[schema]
# Used when the schema document does not name them itself
name = "UISchema"
metadata_type = "UIMetadata"
root_type = "UIComponent"

[rewrite]
# Warn when a wrapper class is not found
warn_on_missing = true

[[rewrite.groups]]
name = "EventAction"
members = ["NavigateAction", "SetStateAction", "SubmitFormAction", "ValidateAction", "CustomAction"]

[[rewrite.groups]]
name = "Node"
members = ["ButtonNode", "InputNode", "TextareaNode", "TextNode", "CardNode", "AlertNode", "ContainerNode", "GridNode", "StackNode", "ChartNode"]
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Target override.
    pub target: Option<Target>,

    /// Version marker override.
    pub version: Option<String>,

    /// Generate docs override.
    pub generate_docs: Option<bool>,

    /// Forbid extra override.
    pub forbid_extra: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.target, Target::Pydantic);
        assert!(config.output.version.is_none());
        assert!(config.output.generate_docs);
        assert!(config.output.indent.is_none());
        assert_eq!(config.emit.sections.len(), 6);
        assert!(!config.emit.forbid_extra);
        assert!(config.emit.binding_records);
        assert_eq!(config.schema.name, "UISchema");
        assert_eq!(config.rewrite.groups.len(), 2);
        assert!(config.rewrite.warn_on_missing);
    }

    #[test]
    fn test_default_content_matches_defaults() {
        let parsed: Config = toml::from_str(ConfigManager::default_config_content()).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.output.target, defaults.output.target);
        assert_eq!(parsed.emit.sections, defaults.emit.sections);
        assert_eq!(parsed.schema.root_type, defaults.schema.root_type);
        assert_eq!(parsed.rewrite.groups, defaults.rewrite.groups);
    }

    #[test]
    fn test_merge_cli_args_target() {
        let args = CliArgs {
            target: Some(Target::Zod),
            ..Default::default()
        };

        let merged = ConfigManager::merge_cli_args(Config::default(), &args);
        assert_eq!(merged.output.target, Target::Zod);
    }

    #[test]
    fn test_merge_cli_args_preserves_unset() {
        let config = Config::default();
        let merged = ConfigManager::merge_cli_args(config.clone(), &CliArgs::default());
        assert_eq!(merged.output.target, config.output.target);
        assert_eq!(merged.output.generate_docs, config.output.generate_docs);
        assert_eq!(merged.emit.forbid_extra, config.emit.forbid_extra);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[output]
target = "zod"
version = "2.0.0"
generate_docs = false
indent = "tab"
line_ending = "crlf"

[emit]
sections = ["enums", "props", "actions", "unions", "components", "schema"]
forbid_extra = true

[schema]
name = "Screen"

[[rewrite.groups]]
name = "Shape"
members = ["Circle", "Square"]
discriminator = "kind"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.target, Target::Zod);
        assert_eq!(config.output.indent, Some(IndentStyle::Tabs));
        assert_eq!(config.output.line_ending, LineEnding::CrLf);
        assert!(config.emit.forbid_extra);
        assert!(config.emit.binding_records);
        assert_eq!(config.schema.name, "Screen");
        assert_eq!(config.schema.root_type, "UIComponent");
        assert_eq!(
            config.rewrite.groups,
            vec![RewriteGroup::new("Shape", ["Circle", "Square"]).with_discriminator("kind")]
        );

        let generator = config.to_generator_config().unwrap();
        assert_eq!(generator.version.as_deref(), Some("2.0.0"));
        assert!(!generator.generate_docs);
        assert_eq!(generator.indent, Some(IndentStyle::Tabs));
        assert_eq!(generator.sections.sections()[1], Section::Props);

        assert_eq!(config.schema_root_fallback().name, "Screen");
    }

    #[test]
    fn test_invalid_section_list() {
        let mut config = Config::default();
        config.emit.sections = vec!["enums".to_string(), "enums".to_string()];
        let err = config.to_generator_config().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "emit.sections"));

        config.emit.sections = vec!["widgets".to_string()];
        assert!(config.to_generator_config().is_err());
    }

    #[test]
    fn test_empty_rewrite_group_rejected() {
        let mut config = Config::default();
        config.rewrite.groups.push(RewriteGroup::new("Empty", Vec::<String>::new()));
        assert!(matches!(
            config.to_rewriter().unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let err = ConfigManager::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guigen.toml");
        std::fs::write(&path, "[output\ntarget = ").unwrap();
        let err = ConfigManager::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }
}
