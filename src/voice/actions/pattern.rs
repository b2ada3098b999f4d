//! CommandPattern - textual patterns with `{name}` placeholders
//!
//! A pattern such as `"set volume to {level}"` compiles into an anchored,
//! case-insensitive matcher where every placeholder captures one or more
//! word characters.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::{Result, VoxError};

/// Parameters extracted from an utterance, in placeholder order
pub type Parameters = IndexMap<String, String>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex is valid"));

/// A compiled command pattern. Immutable once built.
#[derive(Debug, Clone)]
pub struct CommandPattern {
    raw: String,
    /// Distinct placeholder names, first appearance order
    parameter_names: Vec<String>,
    /// Placeholder name for each capture group (may repeat)
    group_names: Vec<String>,
    matcher: Regex,
}

impl CommandPattern {
    /// Compile a pattern. Parameter names are taken from its placeholders.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(VoxError::InvalidPattern {
                pattern: raw,
                reason: "pattern is empty".to_string(),
            });
        }

        let (source, group_names) = compile_source(&raw);
        let matcher = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| VoxError::InvalidPattern {
                pattern: raw.clone(),
                reason: e.to_string(),
            })?;

        let mut parameter_names: Vec<String> = Vec::new();
        for name in &group_names {
            if !parameter_names.contains(name) {
                parameter_names.push(name.clone());
            }
        }

        Ok(Self {
            raw,
            parameter_names,
            group_names,
            matcher,
        })
    }

    /// Compile a pattern and check it against declared parameter names.
    ///
    /// An empty declaration is accepted. Otherwise the declared names must be
    /// exactly the pattern's placeholder names (in any order).
    pub fn with_parameters(raw: impl Into<String>, declared: &[String]) -> Result<Self> {
        let pattern = Self::new(raw)?;
        if declared.is_empty() {
            return Ok(pattern);
        }

        let mut expected: Vec<&str> = pattern.parameter_names.iter().map(String::as_str).collect();
        let mut given: Vec<&str> = declared.iter().map(|s| s.trim()).collect();
        expected.sort_unstable();
        given.sort_unstable();
        given.dedup();

        if expected != given {
            return Err(VoxError::InvalidPattern {
                pattern: pattern.raw,
                reason: format!(
                    "declared parameters {:?} do not match placeholders {:?}",
                    declared, pattern.parameter_names
                ),
            });
        }
        Ok(pattern)
    }

    /// The pattern text as registered (trimmed)
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// True if the whole (trimmed) input matches the pattern
    pub fn matches(&self, input: &str) -> bool {
        self.matcher.is_match(input.trim())
    }

    /// Extract placeholder values from the input.
    ///
    /// Returns an empty map when the input does not match or the pattern has
    /// no placeholders. A placeholder name used twice reports the last value.
    pub fn extract_parameters(&self, input: &str) -> Parameters {
        let mut parameters = Parameters::new();
        let Some(caps) = self.matcher.captures(input.trim()) else {
            return parameters;
        };

        for (index, name) in self.group_names.iter().enumerate() {
            if let Some(value) = caps.get(index + 1) {
                parameters.insert(name.clone(), value.as_str().to_string());
            }
        }
        parameters
    }
}

impl std::fmt::Display for CommandPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Translate the raw pattern into regex source plus the name of each group.
fn compile_source(raw: &str) -> (String, Vec<String>) {
    let mut source = String::from("^");
    let mut group_names = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(raw) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_literal(&mut source, &raw[last..whole.start()]);
        source.push_str(r"(\w+)");
        group_names.push(name.as_str().to_string());
        last = whole.end();
    }
    push_literal(&mut source, &raw[last..]);
    source.push('$');

    (source, group_names)
}

/// Escape literal text; any whitespace run matches one or more spaces.
fn push_literal(source: &mut String, literal: &str) {
    let mut in_space = false;
    let mut buf = [0u8; 4];
    for ch in literal.chars() {
        if ch.is_whitespace() {
            if !in_space {
                source.push_str(r"\s+");
                in_space = true;
            }
        } else {
            in_space = false;
            source.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
        }
    }
}
