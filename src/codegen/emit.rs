use petgraph::Direction;

use crate::codegen::ast::{Expr, Stmt};
use crate::codegen::expr::{
    expected_for_block_entry, translate_expr, wrap_block_list, Expected, TranslateCtx,
};
use crate::codegen::imports::ImportPlan;
use crate::codegen::scope::{pascal_case, Scope};
use crate::config::types::{
    BackendBlock, Expression, ModuleBlock, ParsedPlan, ResourceBlock,
};
use crate::dag::builder::{resolve_reference, BlockKind, ConversionGraph, GraphNode};
use crate::error::{ConvertError, Diagnostic};
use crate::schema::types::{AttributeType, SchemaBlock};

/// A provider actually referenced by the emitted program.
#[derive(Debug, Clone)]
pub struct ProviderRequirement {
    pub source: String,
    pub version: Option<String>,
}

impl ProviderRequirement {
    /// "source" or "source@version" for the result's providers list.
    pub fn pinned(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.source, version),
            None => self.source.clone(),
        }
    }
}

/// Emission state for one conversion. Emitters append statements in the
/// order the walker visits nodes; requirements accumulate in first-use
/// order.
pub struct EmitCtx<'a> {
    pub plan: &'a ParsedPlan,
    pub graph: &'a ConversionGraph,
    pub scope: &'a mut Scope,
    pub imports: &'a mut ImportPlan,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    pub stmts: Vec<Stmt>,
    pub providers_used: Vec<(String, ProviderRequirement)>,
    pub modules_used: Vec<(String, Option<String>)>,
}

impl<'a> EmitCtx<'a> {
    pub fn new(
        plan: &'a ParsedPlan,
        graph: &'a ConversionGraph,
        scope: &'a mut Scope,
        imports: &'a mut ImportPlan,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            plan,
            graph,
            scope,
            imports,
            diagnostics,
            stmts: Vec::new(),
            providers_used: Vec::new(),
            modules_used: Vec::new(),
        }
    }

    fn is_referenced(&self, node_id: &str) -> bool {
        self.graph
            .lookup(node_id)
            .map(|idx| {
                self.graph
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_some()
            })
            .unwrap_or(false)
    }

    /// Resolve the requirement for a provider short name from the
    /// required_providers table, defaulting to the hashicorp namespace.
    fn provider_requirement(&self, name: &str) -> ProviderRequirement {
        if let Some(settings) = &self.plan.terraform {
            if let Some((_, req)) = settings
                .required_providers
                .iter()
                .find(|(n, _)| n == name)
            {
                let source = if req.source.is_empty() {
                    format!("hashicorp/{}", name)
                } else {
                    req.source.clone()
                };
                return ProviderRequirement {
                    source,
                    version: req.version.clone(),
                };
            }
        }
        ProviderRequirement {
            source: format!("hashicorp/{}", name),
            version: None,
        }
    }

    fn record_provider_use(&mut self, name: &str) {
        if self.providers_used.iter().any(|(n, _)| n == name) {
            return;
        }
        let requirement = self.provider_requirement(name);
        self.providers_used.push((name.to_string(), requirement));
    }

    fn record_module_use(&mut self, source: &str, version: Option<String>) {
        if self.modules_used.iter().any(|(s, _)| s == source) {
            return;
        }
        self.modules_used.push((source.to_string(), version));
    }

    /// `const x = <new>` when the node is referenced downstream, a bare
    /// expression statement otherwise.
    fn push_declaration(&mut self, node_id: &str, ident: String, value: Expr) {
        if self.is_referenced(node_id) {
            self.stmts.push(Stmt::Const { name: ident, value });
        } else {
            self.stmts.push(Stmt::Expr(value));
        }
    }
}

/// Emit one node. Dispatch by block kind; deterministic output for a given
/// (plan, graph, emission order).
pub fn emit_node(ctx: &mut EmitCtx, node: &GraphNode) -> Result<(), ConvertError> {
    match node.kind {
        BlockKind::Provider => emit_provider(ctx, node),
        BlockKind::Variable => emit_variable(ctx, node),
        BlockKind::Local => emit_local(ctx, node),
        BlockKind::Module => emit_module(ctx, node),
        BlockKind::Resource => emit_resource(ctx, node, false),
        BlockKind::Data => emit_resource(ctx, node, true),
        BlockKind::Output => emit_output(ctx, node),
    }
    Ok(())
}

fn emit_provider(ctx: &mut EmitCtx, node: &GraphNode) {
    let block = &ctx.plan.providers[node.index];
    let class = format!("{}Provider", pascal_case(&block.name));
    ctx.imports.require_provider_class(&block.name, &class);
    ctx.record_provider_use(&block.name);

    let catalog = ctx.scope.catalog.clone();
    let provider_schema = catalog.provider(&block.name);
    if provider_schema.is_none() {
        ctx.imports.note_missing_schema(&block.name);
    }
    let schema_block = provider_schema.and_then(|(_, s)| s.provider.as_ref()).map(|s| &s.block);

    let preferred = match &block.alias {
        Some(alias) => format!("{}_{}", block.name, alias),
        None => block.name.clone(),
    };
    let ident = ctx.scope.declare(&node.id, &preferred);

    let mut config = lower_block_attributes(ctx, &block.attributes, schema_block);
    if let Some(alias) = &block.alias {
        config.push(("alias".to_string(), Expr::Str(alias.clone())));
    }

    let logical = preferred;
    let value = Expr::New {
        class,
        args: vec![
            Expr::Ident("this".to_string()),
            Expr::Str(logical),
            Expr::Object(config),
        ],
    };
    ctx.push_declaration(&node.id, ident, value);
}

fn emit_variable(ctx: &mut EmitCtx, node: &GraphNode) {
    let block = &ctx.plan.variables[node.index];
    ctx.imports.require_core();

    if block.has_validation {
        ctx.diagnostics.push(Diagnostic::warning(format!(
            "variable \"{}\" has validation rules, which have no generated equivalent",
            block.name
        )));
    }

    let ident = ctx.scope.declare(&node.id, &block.name);
    let mut config = Vec::new();
    if let Some(var_type) = &block.var_type {
        config.push(("type".to_string(), Expr::Str(var_type.clone())));
    }
    if let Some(default) = &block.default {
        let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
        config.push((
            "default".to_string(),
            translate_expr(&mut tctx, default, &Expected::None),
        ));
    }
    if let Some(description) = &block.description {
        config.push(("description".to_string(), Expr::Str(description.clone())));
    }
    if block.sensitive {
        config.push(("sensitive".to_string(), Expr::Bool(true)));
    }
    if let Some(nullable) = block.nullable {
        config.push(("nullable".to_string(), Expr::Bool(nullable)));
    }

    let value = Expr::New {
        class: "cdktf.TerraformVariable".to_string(),
        args: vec![
            Expr::Ident("this".to_string()),
            Expr::Str(block.name.clone()),
            Expr::Object(config),
        ],
    };
    ctx.push_declaration(&node.id, ident, value);
}

fn emit_local(ctx: &mut EmitCtx, node: &GraphNode) {
    let (name, expr) = &ctx.plan.locals[node.index];
    let ident = ctx.scope.declare(&node.id, name);
    let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
    let value = translate_expr(&mut tctx, expr, &Expected::None);
    ctx.stmts.push(Stmt::Const { name: ident, value });
}

fn emit_output(ctx: &mut EmitCtx, node: &GraphNode) {
    let block = &ctx.plan.outputs[node.index];
    ctx.imports.require_core();

    let ident = ctx.scope.declare(&node.id, &block.name);
    let mut config = Vec::new();
    {
        let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
        config.push((
            "value".to_string(),
            translate_expr(&mut tctx, &block.value, &Expected::None),
        ));
    }
    if let Some(description) = &block.description {
        config.push(("description".to_string(), Expr::Str(description.clone())));
    }
    if block.sensitive {
        config.push(("sensitive".to_string(), Expr::Bool(true)));
    }
    if let Some(deps) = depends_on_array(ctx, &block.depends_on) {
        config.push(("dependsOn".to_string(), deps));
    }

    let value = Expr::New {
        class: "cdktf.TerraformOutput".to_string(),
        args: vec![
            Expr::Ident("this".to_string()),
            Expr::Str(block.name.clone()),
            Expr::Object(config),
        ],
    };
    ctx.push_declaration(&node.id, ident, value);
}

fn emit_module(ctx: &mut EmitCtx, node: &GraphNode) {
    let block = &ctx.plan.modules[node.index];
    let (class, import_path) = module_class(block);
    ctx.imports.require_module_class(&import_path, &class);

    let version = block.version.clone().or_else(|| {
        ctx.scope
            .modules
            .modules
            .get(&block.source)
            .and_then(|meta| meta.version.clone())
    });
    ctx.record_module_use(&block.source, version);

    let ident = ctx.scope.declare(&node.id, &block.name);
    let mut config = Vec::new();
    {
        let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
        for (key, value) in &block.arguments {
            let translated = translate_expr(&mut tctx, value, &Expected::None);
            config.push((crate::codegen::scope::camel_case(key), translated));
        }
    }
    if let Some(deps) = depends_on_array(ctx, &block.depends_on) {
        config.push(("dependsOn".to_string(), deps));
    }

    let value = Expr::New {
        class,
        args: vec![
            Expr::Ident("this".to_string()),
            Expr::Str(block.name.clone()),
            Expr::Object(config),
        ],
    };
    ctx.push_declaration(&node.id, ident, value);
}

/// Construct class and import path for a module source. Registry sources
/// use the module name segment; local paths use the last path component.
fn module_class(block: &ModuleBlock) -> (String, String) {
    let segment = if block.is_registry_source() {
        let parts: Vec<&str> = block.source.split('/').collect();
        match parts.as_slice() {
            [_namespace, name, _provider] => *name,
            _ => parts.last().copied().unwrap_or(block.source.as_str()),
        }
    } else {
        block
            .source
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(block.source.as_str())
    };
    (pascal_case(segment), segment.to_string())
}

fn emit_resource(ctx: &mut EmitCtx, node: &GraphNode, is_data: bool) {
    let block: &ResourceBlock = if is_data {
        &ctx.plan.data_sources[node.index]
    } else {
        &ctx.plan.resources[node.index]
    };

    // Remote state is a framework construct, not a provider binding.
    if is_data && block.resource_type == "terraform_remote_state" {
        ctx.imports.require_core();
        let ident = ctx.scope.declare(&node.id, &block.name);
        let config = lower_block_attributes(ctx, &block.attributes, None);
        let value = Expr::New {
            class: "cdktf.DataTerraformRemoteState".to_string(),
            args: vec![
                Expr::Ident("this".to_string()),
                Expr::Str(block.name.clone()),
                Expr::Object(config),
            ],
        };
        ctx.push_declaration(&node.id, ident, value);
        return;
    }

    let provider_name = provider_short_name(block);
    ctx.record_provider_use(&provider_name);

    let catalog = ctx.scope.catalog.clone();
    let shape = if is_data {
        catalog.data_source_schema(&provider_name, &block.resource_type)
    } else {
        catalog.resource_schema(&provider_name, &block.resource_type)
    };
    if shape.is_none() {
        tracing::debug!(
            "no schema for {} {}",
            if is_data { "data source" } else { "resource" },
            block.resource_type
        );
        ctx.imports.note_missing_schema(&provider_name);
    }
    let schema_block = shape.map(|s| &s.block);

    let bindings = ctx.scope.bindings.clone();
    let provider_bindings = bindings.get(&catalog, &provider_name);
    let class = if is_data {
        provider_bindings
            .data_classes
            .get(&block.resource_type)
            .cloned()
            .unwrap_or_else(|| format!("Data{}", pascal_case(&block.resource_type)))
    } else {
        provider_bindings
            .resource_classes
            .get(&block.resource_type)
            .cloned()
            .unwrap_or_else(|| pascal_case(&block.resource_type))
    };
    ctx.imports.require_provider_class(&provider_name, &class);

    let ident = ctx.scope.declare(&node.id, &block.name);
    let mut config = lower_block_attributes(ctx, &block.attributes, schema_block);

    if let Some(count) = &block.count {
        let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
        let expected = Expected::Type(AttributeType::Primitive("number".to_string()));
        config.push(("count".to_string(), translate_expr(&mut tctx, count, &expected)));
    }
    if let Some(for_each) = &block.for_each {
        let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
        config.push((
            "forEach".to_string(),
            translate_expr(&mut tctx, for_each, &Expected::None),
        ));
    }
    if let Some(provider_ref) = &block.provider_ref {
        let id = format!("provider.{}", provider_ref);
        if let Some(provider_ident) = ctx.scope.identifier(&id) {
            config.push(("provider".to_string(), Expr::Ident(provider_ident.to_string())));
        } else {
            tracing::debug!("provider reference {} has no declaration", id);
        }
    }
    if let Some(deps) = depends_on_array(ctx, &block.depends_on) {
        config.push(("dependsOn".to_string(), deps));
    }
    if let Some(lifecycle) = &block.lifecycle {
        let mut entries = Vec::new();
        if lifecycle.create_before_destroy {
            entries.push(("createBeforeDestroy".to_string(), Expr::Bool(true)));
        }
        if lifecycle.prevent_destroy {
            entries.push(("preventDestroy".to_string(), Expr::Bool(true)));
        }
        if !lifecycle.ignore_changes.is_empty() {
            entries.push((
                "ignoreChanges".to_string(),
                Expr::Array(
                    lifecycle
                        .ignore_changes
                        .iter()
                        .map(|c| Expr::Str(c.clone()))
                        .collect(),
                ),
            ));
        }
        if !entries.is_empty() {
            config.push(("lifecycle".to_string(), Expr::Object(entries)));
        }
    }

    let value = Expr::New {
        class,
        args: vec![
            Expr::Ident("this".to_string()),
            Expr::Str(block.name.clone()),
            Expr::Object(config),
        ],
    };
    ctx.push_declaration(&node.id, ident, value);
}

/// The provider a resource belongs to: the explicit `provider = aws.west`
/// base, or the type's prefix before the first underscore.
fn provider_short_name(block: &ResourceBlock) -> String {
    if let Some(provider_ref) = &block.provider_ref {
        return provider_ref
            .split('.')
            .next()
            .unwrap_or(provider_ref)
            .to_string();
    }
    block
        .resource_type
        .split('_')
        .next()
        .unwrap_or(&block.resource_type)
        .to_string()
}

/// Lower a block's attribute list against its schema.
fn lower_block_attributes(
    ctx: &mut EmitCtx,
    attributes: &[(String, Expression)],
    schema_block: Option<&SchemaBlock>,
) -> Vec<(String, Expr)> {
    let mut config = Vec::with_capacity(attributes.len());
    let mut tctx = TranslateCtx::new(ctx.scope, ctx.graph, ctx.imports, ctx.diagnostics);
    for (key, value) in attributes {
        let expected = match schema_block {
            Some(block) => expected_for_block_entry(block, key),
            None => Expected::None,
        };
        let translated = translate_expr(&mut tctx, value, &expected);
        let translated = wrap_block_list(value, &expected, translated);
        config.push((crate::codegen::scope::camel_case(key), translated));
    }
    config
}

/// Resolve a depends_on list to construct identifiers; unresolvable
/// entries drop with a debug log.
fn depends_on_array(ctx: &EmitCtx, deps: &[String]) -> Option<Expr> {
    if deps.is_empty() {
        return None;
    }
    let mut idents = Vec::new();
    for dep in deps {
        let names: Vec<&str> = dep.split('.').collect();
        match resolve_reference(&names, ctx.graph)
            .and_then(|id| ctx.scope.identifier(&id).map(|s| s.to_string()))
        {
            Some(ident) => idents.push(Expr::Ident(ident)),
            None => tracing::debug!("depends_on entry {} has no declaration, dropping", dep),
        }
    }
    if idents.is_empty() {
        None
    } else {
        Some(Expr::Array(idents))
    }
}

/// Backend declarations precede every resource declaration; they are not
/// graph nodes.
pub fn emit_backend(ctx: &mut EmitCtx, backend: &BackendBlock) {
    ctx.imports.require_core();
    let class = format!("cdktf.{}Backend", pascal_case(&backend.backend_type));
    let config = lower_block_attributes(ctx, &backend.attributes, None);
    ctx.stmts.push(Stmt::Expr(Expr::New {
        class,
        args: vec![Expr::Ident("this".to_string()), Expr::Object(config)],
    }));
}
