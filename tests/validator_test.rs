use std::sync::Arc;

use cdkconv::convert::{convert, ConvertOptions};
use cdkconv::error::ConvertError;
use cdkconv::lowering::Language;
use cdkconv::schema::types::ProviderSchemaCatalog;

fn options() -> ConvertOptions {
    ConvertOptions::new(
        Language::TypeScript,
        Arc::new(ProviderSchemaCatalog::empty()),
    )
}

fn expect_conformance(hcl: &str) -> (Vec<String>, String, String) {
    match convert(hcl, &options()).unwrap_err() {
        ConvertError::SchemaConformance {
            path,
            expected,
            found,
        } => (path, expected, found),
        other => panic!("expected SchemaConformance, got {:?}", other),
    }
}

#[test]
fn test_parse_error_carries_hint() {
    let err = convert("resource \"a\" {", &options()).unwrap_err();
    match err {
        ConvertError::Parse { hint, .. } => {
            assert!(hint.contains("valid Terraform"));
        }
        other => panic!("expected Parse, got {:?}", other),
    }
}

#[test]
fn test_top_level_attribute_rejected() {
    let (path, expected, _) = expect_conformance(r#"provider = "aws""#);
    assert_eq!(path, vec!["provider".to_string()]);
    assert_eq!(expected, "a block");
}

#[test]
fn test_resource_label_count() {
    let (path, expected, found) = expect_conformance(r#"resource "only_type" {}"#);
    assert_eq!(path, vec!["resource".to_string(), "only_type".to_string()]);
    assert_eq!(expected, "2 label(s)");
    assert_eq!(found, "1 label(s)");
}

#[test]
fn test_module_requires_source() {
    let (path, expected, _) = expect_conformance(r#"module "m" { foo = 1 }"#);
    assert_eq!(
        path,
        vec!["module".to_string(), "m".to_string(), "source".to_string()]
    );
    assert_eq!(expected, "a source attribute");
}

#[test]
fn test_multiple_backends_rejected() {
    let hcl = r#"
terraform {
  backend "s3" { bucket = "b" }
}

terraform {
  backend "local" { path = "terraform.tfstate" }
}
"#;
    let (path, expected, found) = expect_conformance(hcl);
    assert_eq!(path, vec!["terraform".to_string(), "backend".to_string()]);
    assert_eq!(expected, "at most one backend block");
    assert_eq!(found, "2 backend blocks");
}

#[test]
fn test_unknown_block_ignored() {
    let hcl = r#"
moved {
  from = null_resource.old
  to   = null_resource.new
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(r#"new NullResource(this, "a""#));
}

#[test]
fn test_unknown_attributes_within_blocks_accepted() {
    let hcl = r#"
variable "x" {
  type        = string
  description = "d"
  ephemeral   = true
}
"#;
    assert!(convert(hcl, &options()).is_ok());
}

#[test]
fn test_empty_labels_rejected() {
    let (_, expected, found) = expect_conformance(r#"variable "" {}"#);
    assert_eq!(expected, "a non-empty label");
    assert_eq!(found, "an empty label");
}

#[test]
fn test_unsupported_language_error() {
    use std::str::FromStr;
    let err = cdkconv::lowering::Language::from_str("cobol").unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedLanguage(l) if l == "cobol"));
}
