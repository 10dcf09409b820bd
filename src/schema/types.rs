use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Provider schema catalog ────────────────────────────────────────────────
//
// Mirrors the `terraform providers schema -json` document. Keys of
// `provider_schemas` are fully qualified provider names (FQPNs) like
// `registry.terraform.io/hashicorp/aws`.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSchemaCatalog {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub provider_schemas: HashMap<String, ProviderSchema>,
}

impl ProviderSchemaCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a provider schema by its short name (`aws`), matching the
    /// FQPN suffix `/<name>`. Ties resolve to the lexicographically
    /// smallest FQPN so lookups stay deterministic.
    pub fn provider(&self, name: &str) -> Option<(&str, &ProviderSchema)> {
        let suffix = format!("/{}", name);
        self.provider_schemas
            .iter()
            .filter(|(fqpn, _)| fqpn.ends_with(&suffix) || fqpn.as_str() == name)
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(fqpn, schema)| (fqpn.as_str(), schema))
    }

    pub fn resource_schema(&self, provider: &str, resource_type: &str) -> Option<&SchemaShape> {
        self.provider(provider)?
            .1
            .resource_schemas
            .get(resource_type)
    }

    pub fn data_source_schema(&self, provider: &str, data_type: &str) -> Option<&SchemaShape> {
        self.provider(provider)?
            .1
            .data_source_schemas
            .get(data_type)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSchema {
    #[serde(default)]
    pub provider: Option<SchemaShape>,
    #[serde(default)]
    pub resource_schemas: HashMap<String, SchemaShape>,
    #[serde(default)]
    pub data_source_schemas: HashMap<String, SchemaShape>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaShape {
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub block: SchemaBlock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub attributes: HashMap<String, SchemaAttribute>,
    #[serde(default)]
    pub block_types: HashMap<String, NestedBlockSchema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaAttribute {
    #[serde(rename = "type", default)]
    pub attr_type: Option<AttributeType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedBlockSchema {
    pub nesting_mode: String,
    #[serde(default)]
    pub block: SchemaBlock,
    #[serde(default)]
    pub min_items: Option<u64>,
    #[serde(default)]
    pub max_items: Option<u64>,
}

// ─── The cty type language ──────────────────────────────────────────────────

/// An attribute type in the HCL type language, as serialized by Terraform:
/// either a primitive name (`"string"`) or a compound form
/// (`["list", "string"]`, `["object", {"a": "string"}]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeType {
    Primitive(String),
    Compound(Vec<serde_json::Value>),
}

/// Interpreted view of an [`AttributeType`].
#[derive(Debug, Clone)]
pub enum TypeKind {
    String,
    Number,
    Bool,
    Dynamic,
    List(AttributeType),
    Set(AttributeType),
    Map(AttributeType),
    Object(Vec<(String, AttributeType)>),
    Tuple(Vec<AttributeType>),
    Unknown,
}

impl AttributeType {
    pub fn kind(&self) -> TypeKind {
        match self {
            AttributeType::Primitive(name) => match name.as_str() {
                "string" => TypeKind::String,
                "number" => TypeKind::Number,
                "bool" => TypeKind::Bool,
                "dynamic" => TypeKind::Dynamic,
                _ => TypeKind::Unknown,
            },
            AttributeType::Compound(parts) => {
                let Some(tag) = parts.first().and_then(|t| t.as_str()) else {
                    return TypeKind::Unknown;
                };
                match tag {
                    "list" | "set" | "map" => {
                        let inner = parts
                            .get(1)
                            .and_then(|v| serde_json::from_value(v.clone()).ok())
                            .unwrap_or(AttributeType::Primitive("dynamic".into()));
                        match tag {
                            "list" => TypeKind::List(inner),
                            "set" => TypeKind::Set(inner),
                            _ => TypeKind::Map(inner),
                        }
                    }
                    "object" => {
                        let attrs = parts
                            .get(1)
                            .and_then(|v| v.as_object())
                            .map(|obj| {
                                let mut entries: Vec<(String, AttributeType)> = obj
                                    .iter()
                                    .filter_map(|(k, v)| {
                                        serde_json::from_value(v.clone())
                                            .ok()
                                            .map(|t| (k.clone(), t))
                                    })
                                    .collect();
                                entries.sort_by(|a, b| a.0.cmp(&b.0));
                                entries
                            })
                            .unwrap_or_default();
                        TypeKind::Object(attrs)
                    }
                    "tuple" => {
                        let elems = parts
                            .get(1)
                            .and_then(|v| v.as_array())
                            .map(|arr| {
                                arr.iter()
                                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                                    .collect()
                            })
                            .unwrap_or_default();
                        TypeKind::Tuple(elems)
                    }
                    _ => TypeKind::Unknown,
                }
            }
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::String | TypeKind::Number | TypeKind::Bool
        )
    }
}

// ─── Module catalog ─────────────────────────────────────────────────────────

/// Metadata for module sources referenced by the plan, keyed by source
/// string. Only registry modules carry versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleCatalog {
    #[serde(default)]
    pub modules: HashMap<String, ModuleMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleMeta {
    #[serde(default)]
    pub version: Option<String>,
}

impl ModuleCatalog {
    pub fn empty() -> Self {
        Self::default()
    }
}
