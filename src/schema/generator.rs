use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;

use crate::codegen::scope::pascal_case;
use crate::schema::types::ProviderSchemaCatalog;

/// Resource-model metadata derived from one provider's schema: construct
/// class names and the set of computed attributes per resource type.
/// Built lazily on first lookup and cached per FQPN.
#[derive(Debug, Default)]
pub struct ProviderBindings {
    pub fqpn: String,
    /// resource type (`aws_vpc`) → construct class (`AwsVpc`).
    pub resource_classes: HashMap<String, String>,
    /// data source type (`aws_ami`) → construct class (`DataAwsAmi`).
    pub data_classes: HashMap<String, String>,
    /// resource/data type → attribute names flagged `computed`.
    pub computed_attributes: HashMap<String, HashSet<String>>,
}

impl ProviderBindings {
    fn build(fqpn: &str, catalog: &ProviderSchemaCatalog) -> Self {
        let mut bindings = ProviderBindings {
            fqpn: fqpn.to_string(),
            ..Default::default()
        };
        let Some(schema) = catalog.provider_schemas.get(fqpn) else {
            return bindings;
        };

        for (resource_type, shape) in &schema.resource_schemas {
            bindings
                .resource_classes
                .insert(resource_type.clone(), pascal_case(resource_type));
            let computed: HashSet<String> = shape
                .block
                .attributes
                .iter()
                .filter(|(_, attr)| attr.computed)
                .map(|(name, _)| name.clone())
                .collect();
            bindings
                .computed_attributes
                .insert(resource_type.clone(), computed);
        }
        for (data_type, shape) in &schema.data_source_schemas {
            bindings
                .data_classes
                .insert(data_type.clone(), format!("Data{}", pascal_case(data_type)));
            let computed: HashSet<String> = shape
                .block
                .attributes
                .iter()
                .filter(|(_, attr)| attr.computed)
                .map(|(name, _)| name.clone())
                .collect();
            bindings
                .computed_attributes
                .insert(format!("data.{}", data_type), computed);
        }
        bindings
    }
}

/// Cache of per-FQPN bindings, shareable across conversions. Reads are
/// concurrent; each entry is built once and then immutable.
#[derive(Debug, Default)]
pub struct BindingsCache {
    entries: DashMap<String, Arc<ProviderBindings>>,
}

impl BindingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bindings for a provider, building them on first use. The
    /// short name is resolved to an FQPN against the catalog.
    pub fn get(&self, catalog: &ProviderSchemaCatalog, name: &str) -> Arc<ProviderBindings> {
        let fqpn = catalog
            .provider(name)
            .map(|(fqpn, _)| fqpn.to_string())
            .unwrap_or_else(|| name.to_string());

        if let Some(existing) = self.entries.get(&fqpn) {
            return existing.clone();
        }
        let built = Arc::new(ProviderBindings::build(&fqpn, catalog));
        self.entries.insert(fqpn, built.clone());
        built
    }
}
