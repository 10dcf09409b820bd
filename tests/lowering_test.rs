use std::sync::Arc;

use cdkconv::convert::{convert, ConvertOptions};
use cdkconv::error::{ConvertError, Diagnostic, Severity};
use cdkconv::lowering::{Language, SourceFile, TranslationBackend, TranslationOutput};
use cdkconv::schema::types::ProviderSchemaCatalog;

fn options(language: Language) -> ConvertOptions {
    ConvertOptions::new(language, Arc::new(ProviderSchemaCatalog::empty()))
}

/// A backend that uppercases the word `class` — enough to prove dispatch.
struct MarkerBackend;

impl TranslationBackend for MarkerBackend {
    fn translate(&self, file: &SourceFile, language: Language) -> TranslationOutput {
        TranslationOutput {
            translation: format!("// target: {}\n{}", language, file.contents),
            diagnostics: vec![Diagnostic::warning("marker backend ran")],
        }
    }
}

/// A backend that always fails.
struct FailingBackend;

impl TranslationBackend for FailingBackend {
    fn translate(&self, _file: &SourceFile, _language: Language) -> TranslationOutput {
        TranslationOutput {
            translation: String::new(),
            diagnostics: vec![Diagnostic::error("cannot translate")],
        }
    }
}

#[test]
fn test_reference_language_passes_through() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let result = convert(hcl, &options(Language::TypeScript)).unwrap();
    assert!(result.all.contains("export class MyConvertedCode"));
    assert_eq!(result.stats.language, "typescript");
}

#[test]
fn test_backend_dispatch() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let mut options = options(Language::Python);
    options.backend = Some(Arc::new(MarkerBackend));
    let result = convert(hcl, &options).unwrap();

    assert!(result.all.starts_with("// target: python"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("marker backend ran")));
    assert_eq!(result.stats.language, "python");
}

#[test]
fn test_missing_backend_is_best_effort() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let result = convert(hcl, &options(Language::Go)).unwrap();

    // Reference output returned, with an error diagnostic attached.
    assert!(result.all.contains("export class MyConvertedCode"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error));
}

#[test]
fn test_strict_mode_raises_lowering_error() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let mut options = options(Language::Java);
    options.backend = Some(Arc::new(FailingBackend));
    options.throw_on_translation_error = true;

    let err = convert(hcl, &options).unwrap_err();
    match err {
        ConvertError::Lowering { diagnostics } => {
            assert!(diagnostics.iter().any(|d| d.message.contains("cannot translate")));
        }
        other => panic!("expected Lowering, got {:?}", other),
    }
}

#[test]
fn test_non_strict_failing_backend_keeps_diagnostics() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let mut options = options(Language::CSharp);
    options.backend = Some(Arc::new(FailingBackend));

    let result = convert(hcl, &options).unwrap();
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("cannot translate")));
}
