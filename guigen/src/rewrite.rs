//! Post-generation rewrite pass for Python model files.
//!
//! External Pydantic generators render a named discriminated union as a
//! single-field wrapper:
//!
//! ```text
//! class EventAction(RootModel[Union[NavigateAction, CustomAction]]):
//!     root: Union[NavigateAction, CustomAction] = Field(..., discriminator='type')
//! ```
//!
//! The [`Rewriter`] turns every configured group back into a plain alias,
//! strips `model_config = ConfigDict(extra='forbid')` directives and drops
//! `RootModel` from the pydantic import once nothing uses it. A group whose
//! wrapper is not found is left alone, which makes the pass idempotent.

use std::path::Path;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::RewriteError;

/// One union rendered as a wrapper class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteGroup {
    /// Wrapper class name, kept as the alias name
    pub name: String,

    /// Union members, in declaration order
    pub members: Vec<String>,

    /// Tag field of the `root` union
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
}

fn default_discriminator() -> String {
    "type".to_string()
}

impl RewriteGroup {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
            discriminator: default_discriminator(),
        }
    }

    pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
        self.discriminator = field.into();
        self
    }

    /// The `EventAction` and `Node` groups of the UI schema.
    pub fn defaults() -> Vec<RewriteGroup> {
        vec![
            RewriteGroup::new(
                "EventAction",
                [
                    "NavigateAction",
                    "SetStateAction",
                    "SubmitFormAction",
                    "ValidateAction",
                    "CustomAction",
                ],
            ),
            RewriteGroup::new(
                "Node",
                [
                    "ButtonNode",
                    "InputNode",
                    "TextareaNode",
                    "TextNode",
                    "CardNode",
                    "AlertNode",
                    "ContainerNode",
                    "GridNode",
                    "StackNode",
                    "ChartNode",
                ],
            ),
        ]
    }

    /// Pattern matching the wrapper class of this group.
    fn wrapper_pattern(&self) -> Result<Regex, RewriteError> {
        if self.members.is_empty() {
            return Err(RewriteError::Pattern {
                group: self.name.clone(),
                message: "group has no members".to_string(),
            });
        }

        let members = self
            .members
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join(r"\s*,\s*");
        let union = format!(r"Union\[\s*{}\s*,?\s*\]", members);
        let pattern = format!(
            concat!(
                r"class\s+{name}\(\s*RootModel\[\s*{union}\s*\]\s*\)\s*:\s*",
                r"root\s*:\s*{union}\s*=\s*Field\(\s*\.\.\.\s*,",
                r#"(?:\s*description\s*=\s*(?:'[^']*'|"[^"]*")\s*,)?"#,
                r#"\s*discriminator\s*=\s*['"]{tag}['"]\s*,?\s*\)"#
            ),
            name = regex::escape(&self.name),
            union = union,
            tag = regex::escape(&self.discriminator),
        );

        compile(&self.name, &pattern)
    }

    fn alias_pattern(&self) -> Result<Regex, RewriteError> {
        compile(&self.name, &format!(r"(?m)^{}\s*=\s*Union\[", regex::escape(&self.name)))
    }

    /// The plain alias replacing the wrapper.
    fn alias(&self) -> String {
        let mut out = format!("{} = Union[\n", self.name);
        for member in &self.members {
            out.push_str("    ");
            out.push_str(member);
            out.push_str(",\n");
        }
        out.push(']');
        out
    }
}

/// What one rewrite pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// `extra='forbid'` directives removed
    pub directives_removed: usize,

    /// Groups whose wrapper was replaced by an alias
    pub groups_rewritten: Vec<String>,

    /// Groups with no wrapper in the input
    pub groups_missing: Vec<String>,

    /// Whether `RootModel` was dropped from the pydantic import
    pub import_dropped: bool,
}

impl RewriteReport {
    /// Whether the pass left the input unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.directives_removed == 0 && self.groups_rewritten.is_empty() && !self.import_dropped
    }
}

/// The rewrite pass.
#[derive(Debug, Clone)]
pub struct Rewriter {
    groups: Vec<RewriteGroup>,
    warn_on_missing: bool,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(RewriteGroup::defaults())
    }
}

impl Rewriter {
    pub fn new(groups: Vec<RewriteGroup>) -> Self {
        Self {
            groups,
            warn_on_missing: true,
        }
    }

    /// Log a missing wrapper at `warn` (default) or `debug` level.
    pub fn with_warn_on_missing(mut self, warn: bool) -> Self {
        self.warn_on_missing = warn;
        self
    }

    pub fn groups(&self) -> &[RewriteGroup] {
        &self.groups
    }

    /// Read and rewrite `path`. Writing the result is up to the caller.
    pub fn rewrite_file(&self, path: &Path) -> Result<(String, RewriteReport), RewriteError> {
        let content = std::fs::read_to_string(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "rewriting file");
        self.rewrite_source(&content)
    }

    /// Rewrite generated source text.
    pub fn rewrite_source(&self, content: &str) -> Result<(String, RewriteReport), RewriteError> {
        let mut report = RewriteReport::default();

        let (mut content, removed) = remove_forbid_directives(content)?;
        report.directives_removed = removed;

        for group in &self.groups {
            let wrapper = group.wrapper_pattern()?;
            if wrapper.is_match(&content) {
                content = wrapper
                    .replace_all(&content, regex::NoExpand(&group.alias()))
                    .into_owned();
                tracing::debug!(group = %group.name, "replaced wrapper with union alias");
                report.groups_rewritten.push(group.name.clone());
                continue;
            }

            if group.alias_pattern()?.is_match(&content) {
                tracing::debug!(group = %group.name, "group is already a union alias");
            } else if self.warn_on_missing {
                tracing::warn!(group = %group.name, "wrapper idiom not found, group left unchanged");
            } else {
                tracing::debug!(group = %group.name, "wrapper idiom not found, group left unchanged");
            }
            report.groups_missing.push(group.name.clone());
        }

        let (content, dropped) = drop_unused_root_model(&content)?;
        report.import_dropped = dropped;

        tracing::info!(
            directives_removed = report.directives_removed,
            groups_rewritten = report.groups_rewritten.len(),
            groups_missing = report.groups_missing.len(),
            import_dropped = report.import_dropped,
            "rewrite complete"
        );
        Ok((content, report))
    }
}

/// Matches single- and multi-line forms; `\s` spans the line breaks.
const FORBID_DIRECTIVE: &str = r#"(?m)^([ \t]+)model_config\s*=\s*ConfigDict\(\s*extra\s*=\s*['"]forbid['"]\s*,?\s*\)[ \t]*(?:\n|$)"#;

const PYDANTIC_IMPORT: &str = r"(?m)^from pydantic import (?:\(([^)]*)\)|([^\n(]*))[ \t]*$";

const ROOT_MODEL_WORD: &str = r"\bRootModel\b";

fn compile(group: &str, pattern: &str) -> Result<Regex, RewriteError> {
    Regex::new(pattern).map_err(|e| RewriteError::Pattern {
        group: group.to_string(),
        message: e.to_string(),
    })
}

/// Remove every `extra='forbid'` directive. A class body left empty gets `pass`.
fn remove_forbid_directives(content: &str) -> Result<(String, usize), RewriteError> {
    let pattern = compile("forbid directive", FORBID_DIRECTIVE)?;
    let mut removed = 0;
    let rewritten = pattern.replace_all(content, |caps: &Captures<'_>| {
        removed += 1;
        let indent = &caps[1];
        let end = caps.get(0).map_or(content.len(), |m| m.end());
        if body_continues(&content[end..], indent) {
            String::new()
        } else {
            format!("{}pass\n", indent)
        }
    });
    Ok((rewritten.into_owned(), removed))
}

/// Whether the next non-blank line is indented at least `indent` deep.
fn body_continues(rest: &str, indent: &str) -> bool {
    rest.lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.starts_with(indent))
}

/// Drop `RootModel` from the pydantic import when no other code uses it.
fn drop_unused_root_model(content: &str) -> Result<(String, bool), RewriteError> {
    let import = compile("pydantic import", PYDANTIC_IMPORT)?;
    let word = compile("pydantic import", ROOT_MODEL_WORD)?;

    let without_imports = import.replace_all(content, "");
    if word.is_match(&without_imports) {
        return Ok((content.to_string(), false));
    }

    let mut dropped = false;
    let rewritten = import.replace_all(content, |caps: &Captures<'_>| {
        let parenthesized = caps.get(1).is_some();
        let names = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let all: Vec<&str> = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        let kept: Vec<&str> = all.iter().copied().filter(|name| *name != "RootModel").collect();
        if kept.len() == all.len() {
            return caps[0].to_string();
        }

        dropped = true;
        if parenthesized {
            let body: String = kept.iter().map(|name| format!("    {},\n", name)).collect();
            format!("from pydantic import (\n{})", body)
        } else {
            format!("from pydantic import {}", kept.join(", "))
        }
    });

    let mut content = rewritten.into_owned();
    if dropped {
        // an import left with no names is removed entirely
        content = content
            .replace("from pydantic import (\n)\n", "")
            .replace("from pydantic import \n", "");
    }
    Ok((content, dropped))
}
