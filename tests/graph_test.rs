use std::sync::Arc;

use cdkconv::convert::{convert, ConvertOptions};
use cdkconv::error::ConvertError;
use cdkconv::lowering::Language;
use cdkconv::schema::types::ProviderSchemaCatalog;

fn options() -> ConvertOptions {
    let doc = serde_json::json!({
        "format_version": "1.0",
        "provider_schemas": {
            "registry.terraform.io/hashicorp/null": {
                "provider": { "version": 0, "block": {} },
                "resource_schemas": {
                    "null_resource": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "triggers": { "type": ["map", "string"], "optional": true }
                            }
                        }
                    }
                },
                "data_source_schemas": {
                    "null_data_source": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "inputs": { "type": ["map", "string"], "optional": true }
                            }
                        }
                    }
                }
            }
        }
    });
    let catalog: ProviderSchemaCatalog = serde_json::from_value(doc).unwrap();
    ConvertOptions::new(Language::TypeScript, Arc::new(catalog))
}

/// Declaration position of a logical name in the emitted code.
fn pos(code: &str, logical: &str) -> usize {
    code.find(&format!("(this, \"{}\"", logical))
        .unwrap_or_else(|| panic!("no declaration for {} in:\n{}", logical, code))
}

#[test]
fn test_chain_emits_in_dependency_order() {
    let hcl = r#"
resource "null_resource" "c" {
  triggers = { v = null_resource.b.id }
}

resource "null_resource" "b" {
  triggers = { v = null_resource.a.id }
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(pos(&result.code, "a") < pos(&result.code, "b"));
    assert!(pos(&result.code, "b") < pos(&result.code, "c"));
}

#[test]
fn test_forward_reference_to_data_source() {
    // The data source is declared after the resource that uses it; node
    // registration precedes edge discovery, so ordering still resolves.
    let hcl = r#"
resource "null_resource" "web" {
  triggers = { id = data.null_data_source.cfg.id }
}

data "null_data_source" "cfg" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(pos(&result.code, "cfg") < pos(&result.code, "web"));
}

#[test]
fn test_self_reference_is_not_a_cycle() {
    let hcl = r#"
resource "null_resource" "a" {
  triggers = { me = null_resource.a.id }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(r#"new NullResource(this, "a""#));
}

#[test]
fn test_reserved_prefixes_create_no_edges() {
    let hcl = r#"
resource "null_resource" "a" {
  count = 2
  triggers = {
    idx = count.index
  }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("count.index"));
    // No warning either: intra-block references are expected.
    assert!(
        !result.diagnostics.iter().any(|d| d.message.contains("count.index")),
        "{:?}",
        result.diagnostics
    );
}

#[test]
fn test_depends_on_cycle_detected() {
    let hcl = r#"
resource "null_resource" "a" {
  depends_on = [null_resource.b]
}

resource "null_resource" "b" {
  depends_on = [null_resource.a]
}
"#;
    let err = convert(hcl, &options()).unwrap_err();
    assert!(matches!(err, ConvertError::CycleDetected { .. }));
}

#[test]
fn test_locals_participate_in_ordering() {
    let hcl = r#"
output "o" {
  value = local.derived
}

locals {
  derived = "${null_resource.a.id}-x"
}

resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    let pos_a = pos(&result.code, "a");
    let pos_local = result.code.find("const derived = ").unwrap();
    let pos_out = pos(&result.code, "o");
    assert!(pos_a < pos_local);
    assert!(pos_local < pos_out);
}

#[test]
fn test_dynamic_for_each_forward_reference_orders() {
    let hcl = r#"
resource "null_resource" "consumer" {
  triggers = { id = null_resource.producer.id }
}

resource "null_resource" "producer" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(pos(&result.code, "producer") < pos(&result.code, "consumer"));
}

#[test]
fn test_independent_nodes_keep_registration_order() {
    let hcl = r#"
resource "null_resource" "z" {}
resource "null_resource" "m" {}
resource "null_resource" "a" {}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(pos(&result.code, "z") < pos(&result.code, "m"));
    assert!(pos(&result.code, "m") < pos(&result.code, "a"));
}

#[test]
fn test_module_reference_creates_edge() {
    let hcl = r#"
resource "null_resource" "after" {
  triggers = { id = module.net.vpc_id }
}

module "net" {
  source = "./modules/net"
}
"#;
    let result = convert(hcl, &options()).unwrap();
    let pos_mod = pos(&result.code, "net");
    let pos_res = pos(&result.code, "after");
    assert!(pos_mod < pos_res);
    assert!(result.code.contains("net.vpcIdOutput"));
}
