use std::fmt;

use thiserror::Error;

/// Severity of a non-fatal diagnostic attached to a conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic produced during conversion or lowering. Warnings never
/// prevent success; errors only do when the caller opted into strictness.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Everything that can abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The HCL source failed to parse. Carries the collaborator's message
    /// verbatim plus a remediation hint for the user.
    #[error("failed to parse {file}: {message}\nhint: {hint}")]
    Parse {
        file: String,
        message: String,
        hint: String,
    },

    /// The parsed tree does not conform to the Terraform block grammar.
    #[error("invalid configuration at {}: expected {expected}, found {found}", path.join("."))]
    SchemaConformance {
        path: Vec<String>,
        expected: String,
        found: String,
    },

    /// The reference graph made no progress; the listed nodes form (or
    /// depend on) a cycle.
    #[error("dependency cycle detected involving: {}", unvisited.join(", "))]
    CycleDetected { unvisited: Vec<String> },

    /// An edge was added to a node that was never registered. This is a
    /// bug in reference discovery, not a user error.
    #[error("internal: edge added to unregistered node {id}")]
    MissingNode { id: String },

    #[error("unsupported target language: {0}")]
    UnsupportedLanguage(String),

    /// Raised only when `throw_on_translation_error` is set.
    #[error("translation failed:\n{}", diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n"))]
    Lowering { diagnostics: Vec<Diagnostic> },
}
