//! Diagnostics reported back to the user.
use std::fmt;

use colored::Colorize;
use serde::Serialize;

use crate::ast::Span;

/// Where a diagnostic points: the module's display path plus a span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(path: impl Into<String>, span: Span) -> Self {
        Self { path: path.into(), line: span.line, column: span.column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Code {
    /// Default attribute access yields the wrong type.
    DefaultResolver,
    /// Resolver's first parameter is not the payload type.
    PreviousArgument,
    ReturnType,
    MissingParameter,
    ParameterType,
    /// Resolver without a matching field.
    UnknownField,
    InvalidInterfaces,
    NotAnInterface,
    AttrMissing,
    NonConvergence,
}

impl Code {
    pub fn as_str(self) -> &'static str {
        match self {
            Code::DefaultResolver => "default-resolver",
            Code::PreviousArgument => "previous-argument",
            Code::ReturnType => "return-type",
            Code::MissingParameter => "missing-parameter",
            Code::ParameterType => "parameter-type",
            Code::UnknownField => "unknown-field",
            Code::InvalidInterfaces => "invalid-interfaces",
            Code::NotAnInterface => "not-an-interface",
            Code::AttrMissing => "attr-missing",
            Code::NonConvergence => "non-convergence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    pub code: Code,
    pub message: String,
}

impl Diagnostic {
    pub fn error(location: Location, code: Code, message: impl Into<String>) -> Self {
        Self { location, severity: Severity::Error, code, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Colored terminal rendering; `NO_COLOR` turns colors off.
    pub fn render(&self) -> String {
        let severity = format!("{}:", self.severity.as_str()).red().bold();
        format!(
            "{}: {} {}  {}",
            self.location.to_string().bold(),
            severity,
            self.message,
            format!("[{}]", self.code.as_str()).dimmed(),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}  [{}]",
            self.location,
            self.severity.as_str(),
            self.message,
            self.code.as_str()
        )
    }
}

/// Summary line in the style of `Found 2 errors in 1 file`.
pub fn summary(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors == 0 {
        return "Success: no issues found".to_string();
    }
    let mut files: Vec<&str> = diagnostics.iter().map(|d| d.location.path.as_str()).collect();
    files.sort_unstable();
    files.dedup();
    format!(
        "Found {errors} error{} in {} file{}",
        if errors == 1 { "" } else { "s" },
        files.len(),
        if files.len() == 1 { "" } else { "s" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_display_is_mypy_like() {
        let d = Diagnostic::error(
            Location::new("app/schema.py", Span::new(12, 4)),
            Code::UnknownField,
            "No field with name \"y\" defined",
        );
        assert_eq!(
            d.to_string(),
            "app/schema.py:12:4: error: No field with name \"y\" defined  [unknown-field]"
        );
    }

    #[test]
    fn summary_counts_errors_and_files() {
        let at = |path: &str| Location::new(path, Span::new(1, 0));
        let diagnostics = vec![
            Diagnostic::error(at("a.py"), Code::ReturnType, "x"),
            Diagnostic::error(at("a.py"), Code::ReturnType, "y"),
            Diagnostic::error(at("b.py"), Code::ReturnType, "z"),
        ];
        assert_eq!(summary(&diagnostics), "Found 3 errors in 2 files");
        assert_eq!(summary(&[]), "Success: no issues found");
    }

    #[test]
    fn codes_serialize_kebab_case() {
        assert_eq!(serde_json::to_value(Code::NotAnInterface).unwrap(), serde_json::json!("not-an-interface"));
        assert_eq!(serde_json::to_value(Severity::Error).unwrap(), serde_json::json!(Severity::Error.as_str()));
    }
}
