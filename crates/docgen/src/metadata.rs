//! Inputs handed to the generator by the source parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One parameter of the function being documented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl ArgMeta {
    pub fn new(name: &str, annotation: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            annotation: annotation.map(str::to_string),
        }
    }

    /// Annotation, or "Any" when the source has none.
    pub fn type_name(&self) -> &str {
        self.annotation.as_deref().unwrap_or("Any")
    }
}

/// Facts about one function, as extracted from its source.
///
/// `returns` only carries meaning when `has_return` is set, and `has_return`
/// is only set for an explicit value-producing `return`. `raises` lists the
/// exception types named in explicit `raise` statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionMetadata {
    pub name: String,
    pub args_meta: Vec<ArgMeta>,
    pub has_return: bool,
    pub returns: Option<String>,
    pub has_yields: bool,
    pub yields: Option<String>,
    pub raises: Vec<String>,
    /// Attributes assigned on the receiver; only meaningful for methods.
    pub attributes: Vec<String>,
    pub source_code: Option<String>,
}

impl FunctionMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_arg(mut self, name: &str, annotation: Option<&str>) -> Self {
        self.args_meta.push(ArgMeta::new(name, annotation));
        self
    }

    pub fn with_return(mut self, returns: Option<&str>) -> Self {
        self.has_return = true;
        self.returns = returns.map(str::to_string);
        self
    }

    pub fn with_yields(mut self, yields: Option<&str>) -> Self {
        self.has_yields = true;
        self.yields = yields.map(str::to_string);
        self
    }

    pub fn with_raise(mut self, exception: &str) -> Self {
        if !self.raises.iter().any(|r| r == exception) {
            self.raises.push(exception.to_string());
        }
        self
    }

    pub fn with_attribute(mut self, attribute: &str) -> Self {
        self.attributes.push(attribute.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source_code = Some(source.to_string());
        self
    }

    /// Source text, if present and not blank.
    pub fn source(&self) -> Option<&str> {
        self.source_code
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn raises_exception(&self, exception: &str) -> bool {
        self.raises.iter().any(|r| r == exception)
    }

    /// Display name, with a placeholder for anonymous input.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<function>"
        } else {
            &self.name
        }
    }
}

/// Docstring layout grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Google,
    Numpy,
    Rest,
    /// Generation disabled
    None,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Google => "google",
            Style::Numpy => "numpy",
            Style::Rest => "rest",
            Style::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Style::None)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStyle(pub String);

impl fmt::Display for UnknownStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown docstring style '{}' (expected google, numpy, rest or none)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStyle {}

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Style::Google),
            "numpy" => Ok(Style::Numpy),
            "rest" | "restructuredtext" => Ok(Style::Rest),
            "none" => Ok(Style::None),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}
