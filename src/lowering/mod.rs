use std::fmt;
use std::str::FromStr;

use crate::error::{ConvertError, Diagnostic, Severity};

/// Target languages the converter knows about. TypeScript is the reference
/// language: the framed AST serializes to it directly, and every other
/// target is produced from that source by a translation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    TypeScript,
    Python,
    Java,
    CSharp,
    Go,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Go => "go",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "csharp" | "cs" => Ok(Language::CSharp),
            "go" => Ok(Language::Go),
            other => Err(ConvertError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// A source file handed to a translation backend.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub contents: String,
}

/// The backend's output plus whatever it wants to report.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    pub translation: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts reference-language source into another target language. The
/// implementation is an external collaborator; the dispatcher only routes
/// and classifies its diagnostics.
pub trait TranslationBackend: Send + Sync {
    fn translate(&self, file: &SourceFile, language: Language) -> TranslationOutput;
}

/// Dispatch the framed reference source to the target language.
///
/// TypeScript passes through unchanged. Other targets need a backend; a
/// missing backend or backend errors become diagnostics, escalated to a
/// hard failure only when `throw_on_translation_error` is set.
pub fn lower(
    source: &str,
    language: Language,
    backend: Option<&dyn TranslationBackend>,
    throw_on_translation_error: bool,
) -> Result<(String, Vec<Diagnostic>), ConvertError> {
    if language == Language::TypeScript {
        return Ok((source.to_string(), Vec::new()));
    }

    let Some(backend) = backend else {
        let diagnostics = vec![Diagnostic::error(format!(
            "no translation backend registered for {}; returning reference-language output",
            language
        ))];
        if throw_on_translation_error {
            return Err(ConvertError::Lowering { diagnostics });
        }
        return Ok((source.to_string(), diagnostics));
    };

    let file = SourceFile {
        name: "main.ts".to_string(),
        contents: source.to_string(),
    };
    let output = backend.translate(&file, language);

    let has_errors = output
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error);
    if has_errors && throw_on_translation_error {
        return Err(ConvertError::Lowering {
            diagnostics: output.diagnostics,
        });
    }
    Ok((output.translation, output.diagnostics))
}
