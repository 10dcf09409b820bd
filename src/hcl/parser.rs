use crate::config::types::*;
use crate::error::ConvertError;

/// Build a ParsedPlan from a validated HCL body.
///
/// Block collections keep source order. Locals from multiple `locals {}`
/// blocks are merged with last-wins semantics, keeping the position of the
/// first occurrence so declaration order stays stable.
pub fn build_plan(body: &hcl::Body) -> Result<ParsedPlan, ConvertError> {
    let mut plan = ParsedPlan::default();

    for structure in body.iter() {
        let hcl::Structure::Block(block) = structure else {
            continue;
        };
        match block.identifier() {
            "terraform" => merge_terraform(&mut plan, parse_terraform_block(block)),
            "provider" => plan.providers.push(parse_provider_block(block)),
            "variable" => plan.variables.push(parse_variable_block(block)),
            "output" => plan.outputs.push(parse_output_block(block)),
            "module" => plan.modules.push(parse_module_block(block)),
            "resource" => plan.resources.push(parse_resource_block(block)),
            "data" => plan.data_sources.push(parse_resource_block(block)),
            "locals" => {
                for (name, expr) in parse_locals_block(block) {
                    if let Some(slot) = plan.locals.iter_mut().find(|(n, _)| *n == name) {
                        slot.1 = expr;
                    } else {
                        plan.locals.push((name, expr));
                    }
                }
            }
            other => {
                tracing::debug!("ignoring unknown block type: {}", other);
            }
        }
    }

    Ok(plan)
}

// ─── Block Parsers ───────────────────────────────────────────────────────────

fn merge_terraform(plan: &mut ParsedPlan, settings: TerraformSettings) {
    match &mut plan.terraform {
        None => plan.terraform = Some(settings),
        Some(existing) => {
            for (name, req) in settings.required_providers {
                if !existing.required_providers.iter().any(|(n, _)| *n == name) {
                    existing.required_providers.push((name, req));
                }
            }
            if existing.required_version.is_none() {
                existing.required_version = settings.required_version;
            }
            if existing.backend.is_none() {
                existing.backend = settings.backend;
            }
        }
    }
}

fn parse_terraform_block(block: &hcl::Block) -> TerraformSettings {
    let mut settings = TerraformSettings::default();

    for structure in block.body().iter() {
        match structure {
            hcl::Structure::Block(inner) => match inner.identifier() {
                "required_providers" => {
                    for s in inner.body().iter() {
                        if let hcl::Structure::Attribute(attr) = s {
                            settings
                                .required_providers
                                .push((attr.key.to_string(), parse_required_provider(&attr.expr)));
                        }
                    }
                }
                "backend" => {
                    let backend_type = inner
                        .labels()
                        .first()
                        .map(|l| l.as_str().to_string())
                        .unwrap_or_default();
                    let mut attributes = Vec::new();
                    for s in inner.body().iter() {
                        if let hcl::Structure::Attribute(attr) = s {
                            attributes.push((attr.key.to_string(), convert_expr(&attr.expr)));
                        }
                    }
                    settings.backend = Some(BackendBlock {
                        backend_type,
                        attributes,
                    });
                }
                other => {
                    tracing::debug!("ignoring terraform sub-block: {}", other);
                }
            },
            hcl::Structure::Attribute(attr) => {
                let key: &str = &attr.key;
                if key == "required_version" {
                    settings.required_version = Some(expr_to_string(&attr.expr));
                }
            }
        }
    }

    settings
}

fn parse_required_provider(expr: &hcl::Expression) -> RequiredProvider {
    let mut source = String::new();
    let mut version = None;

    if let hcl::Expression::Object(obj) = expr {
        for (key_expr, value_expr) in obj {
            match object_key_to_string(key_expr).as_str() {
                "source" => source = expr_to_string(value_expr),
                "version" => version = Some(expr_to_string(value_expr)),
                _ => {}
            }
        }
    } else {
        // Legacy form: `aws = "~> 4.0"` pins only the version.
        version = Some(expr_to_string(expr));
    }

    RequiredProvider { source, version }
}

fn parse_provider_block(block: &hcl::Block) -> ProviderBlock {
    let name = first_label(block);
    let mut alias = None;
    let mut attributes = Vec::new();

    for structure in block.body().iter() {
        if let hcl::Structure::Attribute(attr) = structure {
            let key: &str = &attr.key;
            if key == "alias" {
                alias = Some(expr_to_string(&attr.expr));
            } else if key == "version" {
                // Legacy in-block version constraint; requirements come from
                // required_providers.
                tracing::debug!("dropping legacy provider version constraint");
            } else {
                attributes.push((attr.key.to_string(), convert_expr(&attr.expr)));
            }
        }
    }

    ProviderBlock {
        name,
        alias,
        attributes,
    }
}

fn parse_variable_block(block: &hcl::Block) -> VariableBlock {
    let name = first_label(block);
    let mut var = VariableBlock {
        name,
        var_type: None,
        default: None,
        description: None,
        sensitive: false,
        nullable: None,
        has_validation: false,
    };

    for structure in block.body().iter() {
        match structure {
            hcl::Structure::Attribute(attr) => match &*attr.key {
                "type" => var.var_type = Some(expr_to_string(&attr.expr)),
                "default" => var.default = Some(convert_expr(&attr.expr)),
                "description" => var.description = Some(expr_to_string(&attr.expr)),
                "sensitive" => var.sensitive = expr_to_bool(&attr.expr),
                "nullable" => var.nullable = Some(expr_to_bool(&attr.expr)),
                _ => {}
            },
            hcl::Structure::Block(inner) => {
                if inner.identifier() == "validation" {
                    var.has_validation = true;
                }
            }
        }
    }

    var
}

fn parse_output_block(block: &hcl::Block) -> OutputBlock {
    let name = first_label(block);
    let mut out = OutputBlock {
        name,
        value: Expression::null(),
        description: None,
        sensitive: false,
        depends_on: Vec::new(),
    };

    for structure in block.body().iter() {
        if let hcl::Structure::Attribute(attr) = structure {
            match &*attr.key {
                "value" => out.value = convert_expr(&attr.expr),
                "description" => out.description = Some(expr_to_string(&attr.expr)),
                "sensitive" => out.sensitive = expr_to_bool(&attr.expr),
                "depends_on" => out.depends_on = expr_to_string_list(&attr.expr),
                _ => {}
            }
        }
    }

    out
}

fn parse_module_block(block: &hcl::Block) -> ModuleBlock {
    let name = first_label(block);
    let mut module = ModuleBlock {
        name,
        source: String::new(),
        version: None,
        depends_on: Vec::new(),
        arguments: Vec::new(),
    };

    for structure in block.body().iter() {
        if let hcl::Structure::Attribute(attr) = structure {
            match &*attr.key {
                "source" => module.source = expr_to_string(&attr.expr),
                "version" => module.version = Some(expr_to_string(&attr.expr)),
                "depends_on" => module.depends_on = expr_to_string_list(&attr.expr),
                "providers" => {
                    // Provider hand-off maps carry no value for generated code.
                    tracing::debug!("dropping module providers mapping for {}", module.name);
                }
                _ => module
                    .arguments
                    .push((attr.key.to_string(), convert_expr(&attr.expr))),
            }
        }
    }

    module
}

fn parse_resource_block(block: &hcl::Block) -> ResourceBlock {
    let labels: Vec<String> = block
        .labels()
        .iter()
        .map(|l| l.as_str().to_string())
        .collect();
    let mut resource = ResourceBlock {
        resource_type: labels.first().cloned().unwrap_or_default(),
        name: labels.get(1).cloned().unwrap_or_default(),
        provider_ref: None,
        count: None,
        for_each: None,
        depends_on: Vec::new(),
        lifecycle: None,
        attributes: Vec::new(),
    };

    for structure in block.body().iter() {
        match structure {
            hcl::Structure::Attribute(attr) => match &*attr.key {
                "provider" => resource.provider_ref = Some(expr_to_string(&attr.expr)),
                "count" => resource.count = Some(convert_expr(&attr.expr)),
                "for_each" => resource.for_each = Some(convert_expr(&attr.expr)),
                "depends_on" => resource.depends_on = expr_to_string_list(&attr.expr),
                _ => resource
                    .attributes
                    .push((attr.key.to_string(), convert_expr(&attr.expr))),
            },
            hcl::Structure::Block(inner) => match inner.identifier() {
                "lifecycle" => resource.lifecycle = Some(parse_lifecycle_block(inner)),
                "dynamic" => {
                    let dynamic = parse_dynamic_block(inner);
                    resource
                        .attributes
                        .push((dynamic.name.clone(), Expression::Dynamic(Box::new(dynamic))));
                }
                "provisioner" | "connection" => {
                    tracing::debug!(
                        "dropping {} block on {}.{}",
                        inner.identifier(),
                        resource.resource_type,
                        resource.name
                    );
                }
                _ => {
                    let value = nested_block_to_object(inner);
                    push_nested(&mut resource.attributes, inner.identifier(), value);
                }
            },
        }
    }

    resource
}

fn parse_lifecycle_block(block: &hcl::Block) -> LifecycleBlock {
    let mut lc = LifecycleBlock::default();
    for structure in block.body().iter() {
        if let hcl::Structure::Attribute(attr) = structure {
            match &*attr.key {
                "create_before_destroy" => lc.create_before_destroy = expr_to_bool(&attr.expr),
                "prevent_destroy" => lc.prevent_destroy = expr_to_bool(&attr.expr),
                "ignore_changes" => lc.ignore_changes = expr_to_string_list(&attr.expr),
                _ => {}
            }
        }
    }
    lc
}

fn parse_dynamic_block(block: &hcl::Block) -> DynamicBlock {
    let name = first_label(block);
    let mut iterator = name.clone();
    let mut for_each = Expression::null();
    let mut content = Vec::new();

    for structure in block.body().iter() {
        match structure {
            hcl::Structure::Attribute(attr) => match &*attr.key {
                "for_each" => for_each = convert_expr(&attr.expr),
                "iterator" => iterator = expr_to_string(&attr.expr),
                _ => {}
            },
            hcl::Structure::Block(inner) => {
                if inner.identifier() == "content" {
                    for s in inner.body().iter() {
                        match s {
                            hcl::Structure::Attribute(attr) => {
                                content.push((attr.key.to_string(), convert_expr(&attr.expr)));
                            }
                            hcl::Structure::Block(nested) => {
                                let value = nested_block_to_object(nested);
                                push_nested(&mut content, nested.identifier(), value);
                            }
                        }
                    }
                }
            }
        }
    }

    DynamicBlock {
        name,
        iterator,
        for_each,
        content,
    }
}

/// Convert a nested configuration block (`ingress { ... }`) into an object
/// expression, recursing into further nesting.
fn nested_block_to_object(block: &hcl::Block) -> Expression {
    let mut entries = Vec::new();
    for structure in block.body().iter() {
        match structure {
            hcl::Structure::Attribute(attr) => {
                entries.push((attr.key.to_string(), convert_expr(&attr.expr)));
            }
            hcl::Structure::Block(inner) => {
                if inner.identifier() == "dynamic" {
                    let dynamic = parse_dynamic_block(inner);
                    entries.push((dynamic.name.clone(), Expression::Dynamic(Box::new(dynamic))));
                } else {
                    let value = nested_block_to_object(inner);
                    push_nested(&mut entries, inner.identifier(), value);
                }
            }
        }
    }
    Expression::Object(entries)
}

/// Insert a nested block value, collapsing repeated blocks of the same
/// name into an array (`ingress {} ingress {}` → `ingress = [{}, {}]`).
fn push_nested(attributes: &mut Vec<(String, Expression)>, name: &str, value: Expression) {
    if let Some((_, existing)) = attributes.iter_mut().find(|(n, _)| n == name) {
        match existing {
            Expression::Array(items) => items.push(value),
            _ => {
                let prior = std::mem::replace(existing, Expression::null());
                *existing = Expression::Array(vec![prior, value]);
            }
        }
    } else {
        attributes.push((name.to_string(), value));
    }
}

fn parse_locals_block(block: &hcl::Block) -> Vec<(String, Expression)> {
    let mut locals = Vec::new();
    for structure in block.body().iter() {
        if let hcl::Structure::Attribute(attr) = structure {
            locals.push((attr.key.to_string(), convert_expr(&attr.expr)));
        }
    }
    locals
}

fn first_label(block: &hcl::Block) -> String {
    block
        .labels()
        .first()
        .map(|l| l.as_str().to_string())
        .unwrap_or_default()
}

// ─── Expression Conversion ──────────────────────────────────────────────────

/// Convert an hcl::Expression into the converter's Expression IR.
pub fn convert_expr(expr: &hcl::Expression) -> Expression {
    match expr {
        hcl::Expression::Null => Expression::null(),
        hcl::Expression::Bool(b) => Expression::Literal(Value::Bool(*b)),
        hcl::Expression::Number(n) => {
            if let Some(i) = n.as_i64() {
                Expression::Literal(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Expression::Literal(Value::Float(f))
            } else {
                Expression::null()
            }
        }
        hcl::Expression::String(s) => {
            if s.contains("${") {
                template_from_parts(scan_template(s))
            } else {
                Expression::string(s.clone())
            }
        }
        hcl::Expression::Array(items) => {
            Expression::Array(items.iter().map(convert_expr).collect())
        }
        hcl::Expression::Object(obj) => Expression::Object(
            obj.iter()
                .map(|(k, v)| (object_key_to_string(k), convert_expr(v)))
                .collect(),
        ),
        hcl::Expression::TemplateExpr(template) => match template.as_ref() {
            hcl::TemplateExpr::QuotedString(s) => template_from_parts(scan_template(s)),
            hcl::TemplateExpr::Heredoc(heredoc) => {
                let raw = match heredoc.strip {
                    hcl::expr::HeredocStripMode::Indent => strip_indent(&heredoc.template),
                    hcl::expr::HeredocStripMode::None => heredoc.template.clone(),
                };
                Expression::Heredoc(scan_template(&raw))
            }
        },
        hcl::Expression::Variable(var) => Expression::Variable(var.to_string()),
        hcl::Expression::Traversal(traversal) => {
            let base = convert_expr(&traversal.expr);
            let parts = traversal
                .operators
                .iter()
                .map(|op| match op {
                    hcl::expr::TraversalOperator::GetAttr(ident) => {
                        TraversalPart::Attr(ident.to_string())
                    }
                    hcl::expr::TraversalOperator::Index(idx) => match convert_expr(idx) {
                        Expression::Literal(Value::Int(i)) => TraversalPart::Index(i),
                        other => TraversalPart::IndexExpr(Box::new(other)),
                    },
                    hcl::expr::TraversalOperator::LegacyIndex(n) => {
                        TraversalPart::Index(*n as i64)
                    }
                    hcl::expr::TraversalOperator::AttrSplat
                    | hcl::expr::TraversalOperator::FullSplat => TraversalPart::Splat,
                })
                .collect();
            Expression::Traversal {
                base: Box::new(base),
                parts,
            }
        }
        hcl::Expression::FuncCall(func_call) => Expression::FunctionCall {
            name: func_call.name.to_string(),
            args: func_call.args.iter().map(convert_expr).collect(),
        },
        hcl::Expression::Conditional(cond) => Expression::Conditional {
            condition: Box::new(convert_expr(&cond.cond_expr)),
            true_val: Box::new(convert_expr(&cond.true_expr)),
            false_val: Box::new(convert_expr(&cond.false_expr)),
        },
        hcl::Expression::Operation(op) => match op.as_ref() {
            hcl::expr::Operation::Unary(unary) => Expression::UnaryOp {
                op: match unary.operator {
                    hcl::expr::UnaryOperator::Neg => UnaryOp::Neg,
                    hcl::expr::UnaryOperator::Not => UnaryOp::Not,
                },
                operand: Box::new(convert_expr(&unary.expr)),
            },
            hcl::expr::Operation::Binary(binary) => Expression::BinaryOp {
                op: match binary.operator {
                    hcl::expr::BinaryOperator::Eq => BinOp::Eq,
                    hcl::expr::BinaryOperator::NotEq => BinOp::NotEq,
                    hcl::expr::BinaryOperator::Less => BinOp::Lt,
                    hcl::expr::BinaryOperator::LessEq => BinOp::Lte,
                    hcl::expr::BinaryOperator::Greater => BinOp::Gt,
                    hcl::expr::BinaryOperator::GreaterEq => BinOp::Gte,
                    hcl::expr::BinaryOperator::Plus => BinOp::Add,
                    hcl::expr::BinaryOperator::Minus => BinOp::Sub,
                    hcl::expr::BinaryOperator::Mul => BinOp::Mul,
                    hcl::expr::BinaryOperator::Div => BinOp::Div,
                    hcl::expr::BinaryOperator::Mod => BinOp::Mod,
                    hcl::expr::BinaryOperator::And => BinOp::And,
                    hcl::expr::BinaryOperator::Or => BinOp::Or,
                },
                left: Box::new(convert_expr(&binary.lhs_expr)),
                right: Box::new(convert_expr(&binary.rhs_expr)),
            },
        },
        hcl::Expression::ForExpr(for_expr) => Expression::ForExpr {
            collection: Box::new(convert_expr(&for_expr.collection_expr)),
            key_var: for_expr.key_var.as_ref().map(|v| v.to_string()),
            val_var: for_expr.value_var.to_string(),
            key_expr: for_expr
                .key_expr
                .as_ref()
                .map(|e| Box::new(convert_expr(e))),
            value_expr: Box::new(convert_expr(&for_expr.value_expr)),
            condition: for_expr
                .cond_expr
                .as_ref()
                .map(|e| Box::new(convert_expr(e))),
            grouping: for_expr.grouping,
        },
        hcl::Expression::Parenthesis(inner) => convert_expr(inner),
        _ => Expression::string(format!("{:?}", expr)),
    }
}

/// Collapse a single bare interpolation (`"${expr}"`) into the inner
/// expression; everything else stays a template.
fn template_from_parts(parts: Vec<TemplatePart>) -> Expression {
    if parts.len() == 1 {
        if let TemplatePart::Interpolation(expr) = &parts[0] {
            return expr.clone();
        }
    }
    Expression::Template(parts)
}

/// Split a template string into literal and interpolation parts. The
/// scanner is brace-aware so function calls and object literals inside
/// `${...}` survive; `$${` escapes a literal dollar-brace.
pub fn scan_template(s: &str) -> Vec<TemplatePart> {
    let mut parts: Vec<TemplatePart> = Vec::new();
    let mut literal = String::new();
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if i > 0 && bytes[i - 1] == b'$' {
                // `$${` — the previous iteration already pushed one '$'.
                literal.push('{');
                i += 2;
                continue;
            }
            if let Some(end) = find_interpolation_end(s, i + 2) {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let inner = &s[i + 2..end];
                parts.push(TemplatePart::Interpolation(parse_embedded(inner)));
                i = end + 1;
                continue;
            }
        }
        let Some(ch) = s[i..].chars().next() else {
            break;
        };
        literal.push(ch);
        i += ch.len_utf8();
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    parts
}

/// Find the index of the `}` closing an interpolation that starts at
/// `start`, tracking nested braces and quoted strings.
fn find_interpolation_end(s: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut prev = '\0';
    for (offset, ch) in s[start..].char_indices() {
        match ch {
            '"' if prev != '\\' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
        prev = ch;
    }
    None
}

/// Parse an expression embedded in an interpolation by wrapping it in an
/// attribute assignment. Falls back to a dotted reference when the wrapped
/// form does not parse (e.g. exotic constructs).
pub fn parse_embedded(src: &str) -> Expression {
    let wrapped = format!("x = {}", src);
    if let Ok(body) = hcl::from_str::<hcl::Body>(&wrapped) {
        for structure in body.into_inner() {
            if let hcl::Structure::Attribute(attr) = structure {
                return convert_expr(&attr.expr);
            }
        }
    }

    tracing::debug!("falling back to dotted-path parse for interpolation: {}", src);
    let names: Vec<String> = src.trim().split('.').map(|p| p.to_string()).collect();
    match names.split_first() {
        Some((first, rest)) if !rest.is_empty() => Expression::Traversal {
            base: Box::new(Expression::Variable(first.clone())),
            parts: rest
                .iter()
                .map(|n| TraversalPart::Attr(n.clone()))
                .collect(),
        },
        _ => Expression::Variable(src.trim().to_string()),
    }
}

/// Strip the common leading whitespace of every non-empty line (`<<-`).
fn strip_indent(template: &str) -> String {
    let indent = template
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    template
        .lines()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
        + if template.ends_with('\n') { "\n" } else { "" }
}

// ─── Helper Functions ────────────────────────────────────────────────────────

pub fn expr_to_string(expr: &hcl::Expression) -> String {
    match expr {
        hcl::Expression::String(s) => s.clone(),
        hcl::Expression::Variable(v) => v.to_string(),
        hcl::Expression::Number(n) => n.to_string(),
        hcl::Expression::Bool(b) => b.to_string(),
        hcl::Expression::Null => "null".to_string(),
        hcl::Expression::Traversal(t) => {
            let mut parts = Vec::new();
            if let hcl::Expression::Variable(var) = &t.expr {
                parts.push(var.to_string());
            }
            for op in &t.operators {
                match op {
                    hcl::expr::TraversalOperator::GetAttr(ident) => parts.push(ident.to_string()),
                    hcl::expr::TraversalOperator::Index(idx) => {
                        let joined = parts.pop().unwrap_or_default();
                        parts.push(format!("{}[{}]", joined, expr_to_string(idx)));
                    }
                    _ => {}
                }
            }
            parts.join(".")
        }
        hcl::Expression::FuncCall(call) => {
            let args: Vec<String> = call.args.iter().map(expr_to_string).collect();
            format!("{}({})", call.name, args.join(", "))
        }
        hcl::Expression::TemplateExpr(t) => t.to_string(),
        _ => format!("{:?}", expr),
    }
}

fn object_key_to_string(key: &hcl::expr::ObjectKey) -> String {
    match key {
        hcl::expr::ObjectKey::Identifier(id) => id.to_string(),
        hcl::expr::ObjectKey::Expression(expr) => expr_to_string(expr),
        _ => String::new(),
    }
}

fn expr_to_bool(expr: &hcl::Expression) -> bool {
    matches!(expr, hcl::Expression::Bool(true))
}

fn expr_to_string_list(expr: &hcl::Expression) -> Vec<String> {
    match expr {
        hcl::Expression::Array(items) => items.iter().map(expr_to_string).collect(),
        _ => vec![],
    }
}
