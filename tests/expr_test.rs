use std::sync::Arc;

use cdkconv::convert::{convert, ConvertOptions};
use cdkconv::lowering::Language;
use cdkconv::schema::types::ProviderSchemaCatalog;

/// A small aws-shaped catalog exercising primitive, collection, and nested
/// block schemas.
fn aws_catalog() -> Arc<ProviderSchemaCatalog> {
    let doc = serde_json::json!({
        "format_version": "1.0",
        "provider_schemas": {
            "registry.terraform.io/hashicorp/aws": {
                "provider": {
                    "version": 0,
                    "block": {
                        "attributes": { "region": { "type": "string", "optional": true } },
                        "block_types": {}
                    }
                },
                "resource_schemas": {
                    "aws_instance": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "ami": { "type": "string", "required": true },
                                "instance_count": { "type": "number", "optional": true },
                                "tags": { "type": ["map", "string"], "optional": true },
                                "subnet_ids": { "type": ["list", "string"], "optional": true },
                                "user_data": { "type": "string", "optional": true }
                            },
                            "block_types": {}
                        }
                    },
                    "aws_security_group": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "name": { "type": "string", "optional": true }
                            },
                            "block_types": {
                                "ingress": {
                                    "nesting_mode": "list",
                                    "block": {
                                        "attributes": {
                                            "from_port": { "type": "number", "optional": true },
                                            "to_port": { "type": "number", "optional": true },
                                            "protocol": { "type": "string", "optional": true },
                                            "cidr_blocks": { "type": ["list", "string"], "optional": true }
                                        },
                                        "block_types": {}
                                    }
                                }
                            }
                        }
                    },
                    "aws_subnet": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "cidr_block": { "type": "string", "optional": true },
                                "availability_zone": { "type": "string", "optional": true }
                            },
                            "block_types": {}
                        }
                    }
                },
                "data_source_schemas": {
                    "aws_ami": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "most_recent": { "type": "bool", "optional": true },
                                "owners": { "type": ["list", "string"], "required": true }
                            },
                            "block_types": {}
                        }
                    }
                }
            }
        }
    });
    Arc::new(serde_json::from_value(doc).unwrap())
}

fn options() -> ConvertOptions {
    ConvertOptions::new(Language::TypeScript, aws_catalog())
}

#[test]
fn test_template_string_concatenation() {
    let hcl = r#"
variable "env" {}

resource "aws_instance" "web" {
  ami = "ami-12345"
  user_data = "name-${var.env}-suffix"
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result.code.contains("userData: `name-${env.value}-suffix`"),
        "template must interpolate:\n{}",
        result.code
    );
}

#[test]
fn test_single_interpolation_unwraps() {
    let hcl = r#"
variable "ami" {}

resource "aws_instance" "web" {
  ami = "${var.ami}"
}
"#;
    let result = convert(hcl, &options()).unwrap();
    // No template literal left; the inner expression is used directly,
    // coerced because the schema wants a plain string.
    assert!(result.code.contains("ami: cdktf.Token.asString(ami.value)"));
}

#[test]
fn test_known_function_call() {
    let hcl = r#"
variable "cidr" {}

resource "aws_subnet" "a" {
  cidr_block = cidrsubnet(var.cidr, 8, 1)
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("cdktf.Fn.cidrsubnet(cidr.value, 8, 1)"));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn test_unknown_function_warns_and_passes_through() {
    let hcl = r#"
output "x" {
  value = frobnicate("a")
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(r#"cdktf.Fn.frobnicate("a")"#));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("frobnicate")));
}

#[test]
fn test_length_renamed_on_fn_namespace() {
    let hcl = r#"
variable "items" {}

output "n" {
  value = length(var.items)
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("cdktf.Fn.lengthOf(items.value)"));
}

#[test]
fn test_conditional_and_arithmetic() {
    let hcl = r#"
variable "n" {}

resource "aws_instance" "web" {
  ami = "ami-12345"
  instance_count = var.n > 2 ? var.n * 2 : 1
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result.code.contains("(n.value > 2) ? (n.value * 2) : 1"),
        "conditional must lower to a ternary:\n{}",
        result.code
    );
}

#[test]
fn test_for_expression_list() {
    let hcl = r#"
variable "names" {}

output "upper_names" {
  value = [for n in var.names : upper(n)]
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result
            .code
            .contains("names.value.map((n) => cdktf.Fn.upper(n))"),
        "list comprehension must lower to map():\n{}",
        result.code
    );
}

#[test]
fn test_for_expression_list_with_condition() {
    let hcl = r#"
variable "names" {}

output "short" {
  value = [for n in var.names : n if n != "skip"]
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(r#".filter((n) => n !== "skip")"#));
    assert!(result.code.contains(".map((n) => n)"));
}

#[test]
fn test_for_expression_object() {
    let hcl = r#"
variable "tags" {}

output "prefixed" {
  value = { for k, v in var.tags : k => upper(v) }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("Object.fromEntries("));
    assert!(result.code.contains("Object.entries(tags.value)"));
    assert!(result.code.contains("([k, v]) => [k, cdktf.Fn.upper(v)]"));
}

#[test]
fn test_splat_uses_projection_helper() {
    let hcl = r#"
resource "aws_subnet" "a" {}

output "ids" {
  value = aws_subnet.a[*].id
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result.code.contains(r#"cdktf.propertyAccess(a, ["*", "id"])"#),
        "splat must project:\n{}",
        result.code
    );
}

#[test]
fn test_heredoc_literal() {
    let hcl = "resource \"aws_instance\" \"web\" {\n  ami = \"ami-1\"\n  user_data = <<-EOT\n    #!/bin/sh\n    echo hi\n  EOT\n}\n";
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result.code.contains("#!/bin/sh\\necho hi") || result.code.contains("#!/bin/sh"),
        "heredoc body must survive with indent stripped:\n{}",
        result.code
    );
    assert!(
        !result.code.contains("    #!/bin/sh"),
        "common indentation must be stripped:\n{}",
        result.code
    );
}

#[test]
fn test_heredoc_with_interpolation() {
    let hcl = "variable \"msg\" {}\n\nresource \"aws_instance\" \"web\" {\n  ami = \"ami-1\"\n  user_data = <<EOT\nsay ${var.msg}\nEOT\n}\n";
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result.code.contains("say ${msg.value}"),
        "interpolation inside heredoc must translate:\n{}",
        result.code
    );
}

#[test]
fn test_token_coercion_number() {
    let hcl = r#"
variable "count_in" {}

resource "aws_instance" "web" {
  ami = "ami-1"
  instance_count = var.count_in
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result
        .code
        .contains("instanceCount: cdktf.Token.asNumber(countIn.value)"));
}

#[test]
fn test_token_coercion_list() {
    let hcl = r#"
resource "aws_subnet" "a" {}

resource "aws_instance" "web" {
  ami = "ami-1"
  subnet_ids = aws_subnet.a.id
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("subnetIds: cdktf.Token.asList(a.id)"));
}

#[test]
fn test_nested_block_single_becomes_array() {
    let hcl = r#"
resource "aws_security_group" "sg" {
  name = "web"
  ingress {
    from_port   = 80
    to_port     = 80
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result
            .code
            .contains(r#"ingress: [{ fromPort: 80, toPort: 80, protocol: "tcp", cidrBlocks: ["0.0.0.0/0"] }]"#),
        "list-nested block must wrap into an array:\n{}",
        result.code
    );
}

#[test]
fn test_nested_block_repeated_collects() {
    let hcl = r#"
resource "aws_security_group" "sg" {
  ingress {
    from_port = 80
  }
  ingress {
    from_port = 443
  }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result
        .code
        .contains("ingress: [{ fromPort: 80 }, { fromPort: 443 }]"));
}

#[test]
fn test_dynamic_block_lowers_to_iteration() {
    let hcl = r#"
variable "ports" {}

resource "aws_security_group" "sg" {
  dynamic "ingress" {
    for_each = var.ports
    content {
      from_port = ingress.value.port
      protocol  = "tcp"
    }
  }
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(
        result
            .code
            .contains("Object.entries(ports.value).map(([ingressKey, ingressValue]) => ({ fromPort: ingressValue.port, protocol: \"tcp\" }))"),
        "dynamic block must lower to an iteration producing objects:\n{}",
        result.code
    );
}

#[test]
fn test_data_source_reference() {
    let hcl = r#"
data "aws_ami" "ubuntu" {
  most_recent = true
  owners      = ["099720109477"]
}

resource "aws_instance" "web" {
  ami = data.aws_ami.ubuntu.id
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result
        .code
        .contains(r#"const ubuntu = new DataAwsAmi(this, "ubuntu""#));
    assert!(result.code.contains("ami: cdktf.Token.asString(ubuntu.id)"));
    assert!(result.code.contains("mostRecent: true"));
    assert_eq!(result.stats.data.get("aws_ami"), Some(&1));
}

#[test]
fn test_locals_inline_and_last_wins() {
    let hcl = r#"
locals {
  prefix = "app"
}

locals {
  prefix = "app-v2"
  name   = "${local.prefix}-web"
}

output "name" {
  value = local.name
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains(r#"const prefix = "app-v2";"#));
    assert!(!result.code.contains(r#"const prefix = "app";"#));
    assert!(result.code.contains("const name = `${prefix}-web`;"));
    assert!(result.code.contains("value: name"));
}

#[test]
fn test_identifier_collision_suffixes() {
    let hcl = r#"
variable "app_name" {}
variable "appName" {}

output "all" {
  value = [var.app_name, var.appName]
}
"#;
    let result = convert(hcl, &options()).unwrap();

    assert!(result.code.contains(r#"const appName = new cdktf.TerraformVariable(this, "app_name""#));
    assert!(result.code.contains(r#"const appName_1 = new cdktf.TerraformVariable(this, "appName""#));
    assert!(result.code.contains("[appName.value, appName_1.value]"));
}

#[test]
fn test_count_and_for_each_forwarded() {
    let hcl = r#"
variable "n" {}

resource "aws_instance" "web" {
  ami   = "ami-1"
  count = var.n
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("count: cdktf.Token.asNumber(n.value)"));
}

#[test]
fn test_depends_on_emitted_and_ordered() {
    let hcl = r#"
resource "aws_subnet" "a" {}

resource "aws_instance" "web" {
  ami        = "ami-1"
  depends_on = [aws_subnet.a]
}
"#;
    let result = convert(hcl, &options()).unwrap();
    assert!(result.code.contains("dependsOn: [a]"));
    let pos_a = result.code.find(r#"const a = "#).unwrap();
    let pos_web = result.code.find(r#"new AwsInstance(this, "web""#).unwrap();
    assert!(pos_a < pos_web);
}
