use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codegen::ast::{render_statements, Stmt};
use crate::codegen::emit::{emit_backend, emit_node, EmitCtx};
use crate::codegen::imports::ImportPlan;
use crate::codegen::scope::Scope;
use crate::config::validator;
use crate::dag::builder::build_graph;
use crate::dag::walker::emit_ordered;
use crate::error::{ConvertError, Diagnostic};
use crate::hcl as hcl_front;
use crate::hcl::parser::build_plan;
use crate::lowering::{lower, Language, TranslationBackend};
use crate::schema::generator::BindingsCache;
use crate::schema::types::{ModuleCatalog, ProviderSchemaCatalog};

/// The template marker where project conversion splices declarations.
pub const CODE_MARKER: &str = "// define resources here";

/// Options for one conversion.
#[derive(Clone)]
pub struct ConvertOptions {
    pub language: Language,
    pub provider_schema: Arc<ProviderSchemaCatalog>,
    pub module_schema: Arc<ModuleCatalog>,
    /// The class the generated stack extends.
    pub code_container: String,
    pub throw_on_translation_error: bool,
    /// Lowering backend for non-reference languages.
    pub backend: Option<Arc<dyn TranslationBackend>>,
    /// Bindings cache; share one across conversions to reuse derived
    /// provider metadata.
    pub bindings: Arc<BindingsCache>,
}

impl ConvertOptions {
    pub fn new(language: Language, provider_schema: Arc<ProviderSchemaCatalog>) -> Self {
        Self {
            language,
            provider_schema,
            module_schema: Arc::new(ModuleCatalog::empty()),
            code_container: "cdktf.TerraformStack".to_string(),
            throw_on_translation_error: false,
            backend: None,
            bindings: Arc::new(BindingsCache::new()),
        }
    }
}

/// Usage statistics for one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertStats {
    pub number_of_modules: usize,
    pub number_of_providers: usize,
    pub resources: BTreeMap<String, usize>,
    pub data: BTreeMap<String, usize>,
    pub converted_lines: usize,
    pub language: String,
}

/// The conversion result: full file, imports, declarations, requirement
/// pins, statistics, and non-fatal diagnostics.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub all: String,
    pub imports: String,
    pub code: String,
    /// "source" or "source@version", in first-use order.
    pub providers: Vec<String>,
    pub modules: Vec<String>,
    pub stats: ConvertStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert Terraform HCL source into a CDKTF program.
pub fn convert(source: &str, options: &ConvertOptions) -> Result<ConvertResult, ConvertError> {
    let body = hcl_front::parse_source("<input>", source)?;
    validator::validate(&body)?;
    let plan = build_plan(&body)?;
    let graph = build_graph(&plan)?;

    let mut scope = Scope::new(
        options.provider_schema.clone(),
        options.module_schema.clone(),
        options.bindings.clone(),
    );
    let mut imports = ImportPlan::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut ctx = EmitCtx::new(&plan, &graph, &mut scope, &mut imports, &mut diagnostics);

    // Backend expressions come before every declaration.
    if let Some(settings) = &plan.terraform {
        if let Some(backend) = &settings.backend {
            emit_backend(&mut ctx, backend);
        }
    }

    emit_ordered(&graph, |node| emit_node(&mut ctx, node))?;

    let mut stmts: Vec<Stmt> = Vec::new();
    if let Some(required_version) = plan
        .terraform
        .as_ref()
        .and_then(|s| s.required_version.as_ref())
    {
        stmts.push(Stmt::Comment(format!(
            "the source declared Terraform version constraint: {}",
            required_version
        )));
    }
    if !ctx.imports.missing_schema().is_empty() {
        stmts.push(Stmt::Comment(format!(
            "The following providers are missing schema information and might need manual adjustments to synthesize correctly: {}",
            ctx.imports.missing_schema().join(", ")
        )));
    }
    let providers: Vec<String> = ctx
        .providers_used
        .iter()
        .map(|(_, req)| req.pinned())
        .collect();
    let modules: Vec<String> = ctx
        .modules_used
        .iter()
        .map(|(source, version)| match version {
            Some(v) => format!("{}@{}", source, v),
            None => source.clone(),
        })
        .collect();
    stmts.append(&mut ctx.stmts);

    let code = render_statements(&stmts, "");
    let imports_text = imports.render(&options.code_container, !stmts.is_empty());
    let all = frame(&imports_text, &stmts, &options.code_container);

    let stats = ConvertStats {
        number_of_modules: modules.len(),
        number_of_providers: providers.len(),
        resources: count_by_type(plan.resources.iter().map(|r| r.resource_type.as_str())),
        data: count_by_type(plan.data_sources.iter().map(|d| d.resource_type.as_str())),
        converted_lines: source.lines().count(),
        language: options.language.to_string(),
    };

    // Lowering. The reference language passes through; fragment passes
    // reuse the backend, with diagnostics taken from the full-file pass.
    let backend = options.backend.as_deref();
    let (all, lowering_diags) = lower(
        &all,
        options.language,
        backend,
        options.throw_on_translation_error,
    )?;
    let (imports_text, _) = lower(&imports_text, options.language, backend, false)?;
    let (code, _) = lower(&code, options.language, backend, false)?;
    diagnostics.extend(lowering_diags);

    Ok(ConvertResult {
        all,
        imports: imports_text,
        code,
        providers,
        modules,
        stats,
        diagnostics,
    })
}

fn count_by_type<'a>(types: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for t in types {
        *counts.entry(t.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Wrap imports and declarations into the stack class frame.
fn frame(imports: &str, stmts: &[Stmt], code_container: &str) -> String {
    let mut out = String::new();
    if !imports.is_empty() {
        out.push_str(imports);
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "export class MyConvertedCode extends {} {{\n",
        code_container
    ));
    out.push_str("  constructor(scope: Construct, name: string) {\n");
    out.push_str("    super(scope, name);\n");
    if !stmts.is_empty() {
        out.push_str(&render_statements(stmts, "    "));
        out.push('\n');
    }
    out.push_str("  }\n}\n");
    out
}

// ─── Project conversion ─────────────────────────────────────────────────────

/// The provider/module requirement lists of a project configuration
/// (the shape of cdktf.json).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub terraform_providers: Vec<String>,
    #[serde(default)]
    pub terraform_modules: Vec<String>,
}

/// A conversion plus the two project-level application steps: splicing the
/// declarations into a main-file template, and updating the project
/// configuration's requirements.
#[derive(Debug, Clone)]
pub struct ProjectConversion {
    pub result: ConvertResult,
}

impl ProjectConversion {
    /// Insert the converted declarations into a main-file template at the
    /// `// define resources here` marker, preserving the marker's
    /// indentation. Without a marker the code is appended.
    pub fn apply_template(&self, template: &str) -> String {
        let marker_line = template
            .lines()
            .find(|line| line.trim_end().ends_with(CODE_MARKER));
        let Some(marker_line) = marker_line else {
            let mut out = template.to_string();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.result.code);
            out.push('\n');
            return out;
        };

        let indent: String = marker_line
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();
        let indented_code = self
            .result
            .code
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", indent, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut replaced = false;
        template
            .lines()
            .map(|line| {
                if !replaced && line == marker_line {
                    replaced = true;
                    indented_code.clone()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Add the conversion's provider and module requirements to a project
    /// configuration, skipping entries already present.
    pub fn update_config(&self, config: &mut ProjectConfig) {
        for provider in &self.result.providers {
            if !config.terraform_providers.iter().any(|p| p == provider) {
                config.terraform_providers.push(provider.clone());
            }
        }
        for module in &self.result.modules {
            if !config.terraform_modules.iter().any(|m| m == module) {
                config.terraform_modules.push(module.clone());
            }
        }
    }
}

/// Convert source for insertion into an existing CDKTF project.
pub fn convert_project(
    source: &str,
    options: &ConvertOptions,
) -> Result<ProjectConversion, ConvertError> {
    let result = convert(source, options)?;
    Ok(ProjectConversion { result })
}
