use std::sync::Arc;

use cdkconv::convert::{convert, convert_project, ConvertOptions, ProjectConfig};
use cdkconv::error::ConvertError;
use cdkconv::lowering::Language;
use cdkconv::schema::types::ProviderSchemaCatalog;

fn null_catalog() -> Arc<ProviderSchemaCatalog> {
    let doc = serde_json::json!({
        "format_version": "1.0",
        "provider_schemas": {
            "registry.terraform.io/hashicorp/null": {
                "provider": { "version": 0, "block": { "attributes": {}, "block_types": {} } },
                "resource_schemas": {
                    "null_resource": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "triggers": { "type": ["map", "string"], "optional": true }
                            },
                            "block_types": {}
                        }
                    }
                },
                "data_source_schemas": {}
            }
        }
    });
    Arc::new(serde_json::from_value(doc).unwrap())
}

fn options() -> ConvertOptions {
    ConvertOptions::new(Language::TypeScript, null_catalog())
}

#[test]
fn test_single_resource_no_references() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result.code.contains(r#"new NullResource(this, "a", {})"#));
    assert!(result
        .imports
        .contains(r#"import { NullResource } from "./.gen/providers/null";"#));
    assert_eq!(result.providers, vec!["hashicorp/null"]);
    assert_eq!(result.stats.number_of_providers, 1);
    assert_eq!(result.stats.resources.get("null_resource"), Some(&1));
}

#[test]
fn test_reference_across_resources() {
    let hcl = r#"
resource "null_resource" "a" {}

resource "null_resource" "b" {
  triggers = {
    id = null_resource.a.id
  }
}
"#;
    let result = convert(hcl, &options()).unwrap();

    let pos_a = result.code.find(r#"const a = new NullResource(this, "a""#).unwrap();
    let pos_b = result.code.find(r#"new NullResource(this, "b""#).unwrap();
    assert!(pos_a < pos_b, "a must be declared before b:\n{}", result.code);
    assert!(
        result.code.contains("cdktf.Token.asString(a.id)"),
        "primitive attribute fed a computed reference must coerce:\n{}",
        result.code
    );
}

#[test]
fn test_cycle_detection() {
    let hcl = r#"
resource "null_resource" "a" {
  triggers = { v = null_resource.b.id }
}

resource "null_resource" "b" {
  triggers = { v = null_resource.a.id }
}
"#;
    let err = convert(hcl, &options()).unwrap_err();
    match err {
        ConvertError::CycleDetected { unvisited } => {
            assert_eq!(
                unvisited,
                vec![
                    "resource.null_resource.a".to_string(),
                    "resource.null_resource.b".to_string()
                ]
            );
        }
        other => panic!("expected CycleDetected, got {:?}", other),
    }
}

#[test]
fn test_variable_and_output() {
    let hcl = r#"
variable "r" {
  type = string
}

output "o" {
  value = var.r
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result.imports.contains(r#"import * as cdktf from "cdktf";"#));
    let pos_r = result
        .code
        .find(r#"const r = new cdktf.TerraformVariable(this, "r""#)
        .unwrap();
    let pos_o = result
        .code
        .find(r#"new cdktf.TerraformOutput(this, "o""#)
        .unwrap();
    assert!(pos_r < pos_o, "o must come after r:\n{}", result.code);
    assert!(result.code.contains("value: r.value"));
    assert!(result.code.contains(r#"type: "string""#));
}

#[test]
fn test_module_with_version() {
    let hcl = r#"
module "net" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "3.19.0"
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert_eq!(result.modules, vec!["terraform-aws-modules/vpc/aws@3.19.0"]);
    assert_eq!(result.stats.number_of_modules, 1);
    assert!(result
        .imports
        .contains(r#"import { Vpc } from "./.gen/modules/vpc";"#));
    assert!(result.code.contains(r#"new Vpc(this, "net", {})"#));
}

#[test]
fn test_backend_precedes_resources() {
    let hcl = r#"
terraform {
  backend "s3" {
    bucket = "b"
    key    = "k"
    region = "us-east-1"
  }
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();

    let pos_backend = result.code.find("new cdktf.S3Backend(this, ").unwrap();
    let pos_resource = result.code.find("new NullResource(this, ").unwrap();
    assert!(pos_backend < pos_resource);
    assert!(result.code.contains(r#"bucket: "b""#));
    assert!(result.imports.contains(r#"import * as cdktf from "cdktf";"#));
}

#[test]
fn test_empty_input() {
    let result = convert("", &options()).unwrap();
    assert_eq!(result.code, "");
    assert_eq!(result.providers, Vec::<String>::new());
    assert_eq!(result.stats.converted_lines, 0);
    // The default container is framework-prefixed, so imports exist.
    assert!(result.imports.contains("constructs"));

    let mut bare = options();
    bare.code_container = "constructs.Construct".to_string();
    let result = convert("", &bare).unwrap();
    assert_eq!(result.imports, "");
}

#[test]
fn test_determinism() {
    let hcl = r#"
variable "region" { default = "us-east-1" }

resource "null_resource" "a" {}

resource "null_resource" "b" {
  triggers = { id = null_resource.a.id, region = var.region }
}

output "o" { value = null_resource.b.id }
"#;
    let first = convert(hcl, &options()).unwrap();
    let second = convert(hcl, &options()).unwrap();
    assert_eq!(first.all, second.all);
    assert_eq!(first.providers, second.providers);
    assert_eq!(first.code, second.code);
}

#[test]
fn test_reordered_blocks_same_declarations() {
    let forward = r#"
resource "null_resource" "a" {}
resource "null_resource" "b" {
  triggers = { id = null_resource.a.id }
}
"#;
    let reversed = r#"
resource "null_resource" "b" {
  triggers = { id = null_resource.a.id }
}
resource "null_resource" "a" {}
"#;
    let first = convert(forward, &options()).unwrap();
    let second = convert(reversed, &options()).unwrap();

    // Same declarations and identifiers; a precedes b in both.
    for needle in [
        r#"const a = new NullResource(this, "a""#,
        r#"new NullResource(this, "b""#,
        "cdktf.Token.asString(a.id)",
    ] {
        assert!(first.code.contains(needle), "missing {} in:\n{}", needle, first.code);
        assert!(second.code.contains(needle), "missing {} in:\n{}", needle, second.code);
    }
    let pos_a = second.code.find(r#"const a = "#).unwrap();
    let pos_b = second.code.find(r#"new NullResource(this, "b""#).unwrap();
    assert!(pos_a < pos_b);
}

#[test]
fn test_converted_lines_counts_unterminated_final_line() {
    let result = convert("resource \"null_resource\" \"a\" {}\n", &options()).unwrap();
    assert_eq!(result.stats.converted_lines, 1);
    let result = convert("resource \"null_resource\" \"a\" {}", &options()).unwrap();
    assert_eq!(result.stats.converted_lines, 1);
}

#[test]
fn test_provider_requirements_from_required_providers() {
    let hcl = r#"
terraform {
  required_providers {
    null = {
      source  = "hashicorp/null"
      version = "3.2.1"
    }
  }
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert_eq!(result.providers, vec!["hashicorp/null@3.2.1"]);
}

#[test]
fn test_missing_schema_comment() {
    let hcl = r#"resource "fancy_widget" "w" { name = "x" }"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result
        .code
        .contains("missing schema information and might need manual adjustments"));
    assert!(result.code.contains("fancy"));
    assert!(result.code.contains(r#"new FancyWidget(this, "w""#));
    assert_eq!(result.providers, vec!["hashicorp/fancy"]);
}

#[test]
fn test_unknown_reference_kept_literal() {
    let hcl = r#"
resource "null_resource" "a" {
  triggers = { v = null_resource.ghost.id }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("null_resource.ghost.id"));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("null_resource.ghost.id")));
}

#[test]
fn test_wrapped_class_frame() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result
        .all
        .contains("export class MyConvertedCode extends cdktf.TerraformStack {"));
    assert!(result.all.contains("constructor(scope: Construct, name: string)"));
    assert!(result.all.contains("super(scope, name);"));
}

#[test]
fn test_project_conversion_template_marker() {
    let hcl = r#"resource "null_resource" "a" {}"#;
    let conversion = convert_project(hcl, &options()).unwrap();

    let template = "class Main {\n  constructor() {\n    // define resources here\n  }\n}\n";
    let applied = conversion.apply_template(template);
    assert!(applied.contains(r#"    new NullResource(this, "a", {});"#));
    assert!(!applied.contains("// define resources here"));

    let mut config = ProjectConfig::default();
    conversion.update_config(&mut config);
    assert_eq!(config.terraform_providers, vec!["hashicorp/null"]);
    assert!(config.terraform_modules.is_empty());

    // Updating twice must not duplicate entries.
    conversion.update_config(&mut config);
    assert_eq!(config.terraform_providers.len(), 1);
}

#[test]
fn test_remote_state_uses_framework_construct() {
    let hcl = r#"
data "terraform_remote_state" "net" {
  backend = "s3"
}

resource "null_resource" "a" {
  triggers = { id = data.terraform_remote_state.net.outputs.vpc_id }
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result
        .code
        .contains(r#"const net = new cdktf.DataTerraformRemoteState(this, "net", { backend: "s3" })"#));
    // Remote state is framework-owned; only the real provider is required.
    assert_eq!(result.providers, vec!["hashicorp/null"]);
}

#[test]
fn test_required_version_comment() {
    let hcl = r#"
terraform {
  required_version = ">= 1.2.0"
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(">= 1.2.0"));
}

#[test]
fn test_provider_block_and_alias() {
    let hcl = r#"
provider "null" {}

provider "null" {
  alias = "secondary"
}

resource "null_resource" "a" {
  provider = null.secondary
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result.code.contains(r#"new NullProvider(this, "null", {})"#));
    assert!(result
        .code
        .contains(r#"new NullProvider(this, "null_secondary", { alias: "secondary" })"#));
    // The aliased provider is referenced, so it is bound and passed along.
    assert!(result.code.contains("provider: nullSecondary"));
    let pos_provider = result.code.find("nullSecondary = ").unwrap();
    let pos_resource = result.code.find(r#"new NullResource(this, "a""#).unwrap();
    assert!(pos_provider < pos_resource);
}
