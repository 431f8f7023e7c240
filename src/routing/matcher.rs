//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Turn `/users/{id}/posts/{slug}` into an anchored matcher
//! - Record parameter names in template-declaration order
//! - Extract parameters from a concrete path
//!
//! # Design Decisions
//! - Placeholder names: ASCII letters, digits, `_` and `-`, starting with a
//!   letter or `_`
//! - Each placeholder matches one or more non-`/` characters
//! - Literal text is escaped; the whole path must match, with an optional
//!   trailing slash
//! - Capture groups are positional so that names containing `-` are allowed

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::DispatchError;

const PLACEHOLDER: &str = r"\{([A-Za-z_][A-Za-z0-9_-]*)\}";
const SEGMENT: &str = "([^/]+)";

/// Route parameters in template-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All parameters as a JSON object of strings.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<_, _>>(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl CompiledPattern {
    /// Compile a route template.
    ///
    /// Fails with `MalformedRoute` when the template is empty, lacks a leading
    /// `/`, declares the same parameter twice, or the expression cannot be built.
    pub fn compile(template: &str) -> Result<Self, DispatchError> {
        if !template.starts_with('/') {
            return Err(DispatchError::malformed(
                template,
                "Route paths must start with a forward slash.",
            ));
        }

        let placeholder =
            Regex::new(PLACEHOLDER).map_err(|e| DispatchError::malformed(template, e.to_string()))?;

        let mut expression = String::from("^");
        let mut param_names: Vec<String> = Vec::new();
        let mut cursor = 0;

        for caps in placeholder.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if param_names.iter().any(|n| n == name) {
                return Err(DispatchError::malformed(
                    template,
                    format!("parameter '{name}' is declared more than once"),
                ));
            }

            expression.push_str(&regex::escape(&template[cursor..whole.start()]));
            expression.push_str(SEGMENT);
            param_names.push(name.to_string());
            cursor = whole.end();
        }
        expression.push_str(&regex::escape(&template[cursor..]));

        while expression.ends_with('/') {
            expression.pop();
        }
        expression.push_str("/?$");

        let regex =
            Regex::new(&expression).map_err(|e| DispatchError::malformed(template, e.to_string()))?;

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Match a concrete path. Returns parameters in declaration order.
    pub fn matches(&self, path: &str) -> Option<ParamMap> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamMap::new();
        for (index, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.get(index + 1) {
                params.insert(name.as_str(), value.as_str());
            }
        }
        Some(params)
    }
}

/// Compile a route template into a matcher.
pub fn compile(template: &str) -> Result<CompiledPattern, DispatchError> {
    CompiledPattern::compile(template)
}
