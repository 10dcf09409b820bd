use crate::codegen::ast::{is_identifier, Expr, TemplateElem};
use crate::codegen::imports::ImportPlan;
use crate::codegen::scope::{camel_case, sanitize_identifier, Scope};
use crate::config::types::{Expression, TemplatePart, TraversalPart, UnaryOp, Value};
use crate::dag::builder::{resolve_reference, ConversionGraph};
use crate::error::Diagnostic;
use crate::schema::types::{AttributeType, SchemaBlock, TypeKind};

/// Terraform built-in functions the framework namespace mirrors. Calls to
/// anything else pass through with a warning.
const KNOWN_FUNCTIONS: &[&str] = &[
    "abs", "abspath", "alltrue", "anytrue", "base64decode", "base64encode", "base64gzip",
    "base64sha256", "base64sha512", "basename", "can", "ceil", "chomp", "chunklist", "cidrhost",
    "cidrnetmask", "cidrsubnet", "cidrsubnets", "coalesce", "coalescelist", "compact", "concat",
    "contains", "csvdecode", "dirname", "distinct", "element", "endswith", "file", "filebase64",
    "fileexists", "filemd5", "fileset", "filesha256", "flatten", "floor", "format", "formatdate",
    "formatlist", "indent", "index", "join", "jsondecode", "jsonencode", "keys", "length",
    "log", "lookup", "lower", "matchkeys", "max", "md5", "merge", "min", "nonsensitive",
    "one", "parseint", "pathexpand", "pow", "range", "regex", "regexall", "replace", "reverse",
    "sensitive", "setintersection", "setproduct", "setsubtract", "setunion", "sha1", "sha256",
    "sha512", "signum", "slice", "sort", "split", "startswith", "strrev", "substr", "sum",
    "templatefile", "timeadd", "timestamp", "title", "tobool", "tolist", "tomap", "tonumber",
    "toset", "tostring", "trim", "trimprefix", "trimspace", "trimsuffix", "try", "upper",
    "urlencode", "uuid", "values", "yamldecode", "yamlencode", "zipmap",
];

/// Function names that collide with framework reserved members and are
/// renamed on the `Fn` namespace.
const RENAMED_FUNCTIONS: &[(&str, &str)] = &[("length", "lengthOf"), ("index", "indexOf")];

/// What the schema expects the translated expression to be.
#[derive(Debug, Clone)]
pub enum Expected<'a> {
    None,
    Type(AttributeType),
    /// An object with known attributes and nested blocks.
    Block(&'a SchemaBlock),
    /// A list of such objects (list/set-nested blocks).
    BlockList(&'a SchemaBlock),
}

/// Mutable state threaded through one translation.
pub struct TranslateCtx<'a> {
    pub scope: &'a mut Scope,
    pub graph: &'a ConversionGraph,
    pub imports: &'a mut ImportPlan,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    /// Active dynamic-block iterators: (name, key ident, value ident).
    iterators: Vec<(String, String, String)>,
}

impl<'a> TranslateCtx<'a> {
    pub fn new(
        scope: &'a mut Scope,
        graph: &'a ConversionGraph,
        imports: &'a mut ImportPlan,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            scope,
            graph,
            imports,
            diagnostics,
            iterators: Vec::new(),
        }
    }
}

/// Translate one HCL expression into the target AST, applying schema-aware
/// token coercion where the declared type and the reference disagree.
pub fn translate_expr(ctx: &mut TranslateCtx, expr: &Expression, expected: &Expected) -> Expr {
    match expr {
        Expression::Literal(value) => literal(value),

        Expression::Array(items) => {
            let elem_expected = element_expected(expected);
            Expr::Array(
                items
                    .iter()
                    .map(|item| translate_expr(ctx, item, &elem_expected))
                    .collect(),
            )
        }

        Expression::Object(entries) => translate_object(ctx, entries, expected),

        Expression::Variable(_) | Expression::Traversal { .. } => {
            translate_reference(ctx, expr, expected)
        }

        Expression::FunctionCall { name, args } => {
            if !KNOWN_FUNCTIONS.contains(&name.as_str()) {
                ctx.diagnostics.push(Diagnostic::warning(format!(
                    "unknown function \"{}\" passed through to Fn.{}",
                    name, name
                )));
            }
            let mapped = RENAMED_FUNCTIONS
                .iter()
                .find(|(from, _)| *from == name.as_str())
                .map(|(_, to)| *to)
                .unwrap_or(name.as_str());
            ctx.imports.require_core();
            let args = args
                .iter()
                .map(|arg| translate_expr(ctx, arg, &Expected::None))
                .collect();
            Expr::cdktf("Fn").member(camel_case(mapped)).call(args)
        }

        Expression::Conditional {
            condition,
            true_val,
            false_val,
        } => Expr::Ternary {
            cond: Box::new(translate_expr(ctx, condition, &Expected::None)),
            then_val: Box::new(translate_expr(ctx, true_val, expected)),
            else_val: Box::new(translate_expr(ctx, false_val, expected)),
        },

        Expression::BinaryOp { op, left, right } => Expr::Binary {
            op: op.symbol(),
            left: Box::new(translate_expr(ctx, left, &Expected::None)),
            right: Box::new(translate_expr(ctx, right, &Expected::None)),
        },

        Expression::UnaryOp { op, operand } => Expr::Unary {
            op: match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            },
            operand: Box::new(translate_expr(ctx, operand, &Expected::None)),
        },

        Expression::ForExpr { .. } => translate_for(ctx, expr),

        Expression::Template(parts) => translate_template(ctx, parts),
        Expression::Heredoc(parts) => translate_template(ctx, parts),

        Expression::Dynamic(dynamic) => {
            let content_schema = match expected {
                Expected::Block(block) | Expected::BlockList(block) => Some(*block),
                _ => None,
            };
            translate_dynamic(ctx, dynamic, content_schema)
        }
    }
}

fn literal(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::Null,
        Value::Bool(b) => Expr::Bool(*b),
        Value::Int(i) => Expr::Int(*i),
        Value::Float(f) => Expr::Float(*f),
        Value::String(s) => Expr::Str(s.clone()),
    }
}

fn element_expected<'a>(expected: &Expected<'a>) -> Expected<'a> {
    match expected {
        Expected::Type(t) => match t.kind() {
            TypeKind::List(inner) | TypeKind::Set(inner) => Expected::Type(inner),
            _ => Expected::None,
        },
        Expected::BlockList(block) => Expected::Block(*block),
        _ => Expected::None,
    }
}

fn translate_object(
    ctx: &mut TranslateCtx,
    entries: &[(String, Expression)],
    expected: &Expected,
) -> Expr {
    let mut out = Vec::with_capacity(entries.len());
    match expected {
        // A bare object against a list-nested block is its single element.
        Expected::Block(block) | Expected::BlockList(block) => {
            for (key, value) in entries {
                let value_expected = expected_for_block_entry(block, key);
                let translated = translate_expr(ctx, value, &value_expected);
                let translated = wrap_block_list(value, &value_expected, translated);
                out.push((camel_case(key), translated));
            }
        }
        Expected::Type(t) => match t.kind() {
            TypeKind::Map(inner) => {
                for (key, value) in entries {
                    let translated = translate_expr(ctx, value, &Expected::Type(inner.clone()));
                    out.push((key.clone(), translated));
                }
            }
            TypeKind::Object(attrs) => {
                for (key, value) in entries {
                    let value_expected = attrs
                        .iter()
                        .find(|(name, _)| name == key)
                        .map(|(_, ty)| Expected::Type(ty.clone()))
                        .unwrap_or(Expected::None);
                    out.push((camel_case(key), translate_expr(ctx, value, &value_expected)));
                }
            }
            _ => {
                for (key, value) in entries {
                    out.push((key.clone(), translate_expr(ctx, value, &Expected::None)));
                }
            }
        },
        _ => {
            for (key, value) in entries {
                out.push((key.clone(), translate_expr(ctx, value, &Expected::None)));
            }
        }
    }
    Expr::Object(out)
}

/// Pick the expected shape for one entry of a schema block: a typed
/// attribute, a nested block, or nothing.
pub fn expected_for_block_entry<'a>(block: &'a SchemaBlock, key: &str) -> Expected<'a> {
    if let Some(attr) = block.attributes.get(key) {
        return attr
            .attr_type
            .as_ref()
            .map(|t| Expected::Type(t.clone()))
            .unwrap_or(Expected::None);
    }
    if let Some(nested) = block.block_types.get(key) {
        return match nested.nesting_mode.as_str() {
            "list" | "set" => Expected::BlockList(&nested.block),
            _ => Expected::Block(&nested.block),
        };
    }
    Expected::None
}

/// A single object where the schema wants a list of blocks gets wrapped
/// into a one-element array.
pub fn wrap_block_list(source: &Expression, expected: &Expected, translated: Expr) -> Expr {
    if matches!(expected, Expected::BlockList(_))
        && matches!(source, Expression::Object(_))
    {
        return Expr::Array(vec![translated]);
    }
    translated
}

// ─── References ─────────────────────────────────────────────────────────────

fn translate_reference(ctx: &mut TranslateCtx, expr: &Expression, expected: &Expected) -> Expr {
    let (base_name, parts): (&str, &[TraversalPart]) = match expr {
        Expression::Variable(name) => (name.as_str(), &[]),
        Expression::Traversal { base, parts } => match base.as_ref() {
            Expression::Variable(name) => (name.as_str(), parts.as_slice()),
            _ => {
                // Traversal over a computed base: `split(",", x)[0]`.
                let mut out = translate_expr(ctx, base, &Expected::None);
                for part in parts {
                    out = apply_part(ctx, out, part);
                }
                return out;
            }
        },
        _ => unreachable!("translate_reference called on non-reference"),
    };

    // Dynamic-block iterators shadow everything else.
    if let Some((_, key_ident, value_ident)) = ctx
        .iterators
        .iter()
        .rev()
        .find(|(name, _, _)| name.as_str() == base_name)
        .cloned()
    {
        return iterator_access(ctx, &key_ident, &value_ident, parts);
    }

    let names = match expr.leading_names() {
        Some(names) => names.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        None => vec![base_name.to_string()],
    };
    let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();

    let Some(node_id) = resolve_reference(&name_refs, ctx.graph) else {
        // Unmatched references stay literal in the emitted expression.
        let text = reference_source(base_name, parts);
        if !is_intra_block(base_name) {
            ctx.diagnostics.push(Diagnostic::warning(format!(
                "reference \"{}\" does not resolve to a known block and was kept as-is",
                text
            )));
        }
        return Expr::Raw(text);
    };

    let Some(ident) = ctx.scope.identifier(&node_id).map(|s| s.to_string()) else {
        // The walker emits referencees first, so this indicates a bug;
        // degrade to literal text rather than panicking.
        tracing::warn!("reference to {} before its declaration", node_id);
        return Expr::Raw(reference_source(base_name, parts));
    };

    let kind = node_id.split('.').next().unwrap_or_default();
    match kind {
        "var" => {
            let base = Expr::Ident(ident).member("value");
            let access = apply_parts(ctx, base, &parts[1..]);
            maybe_coerce(ctx, access, expected, true)
        }
        "local" => apply_parts(ctx, Expr::Ident(ident), &parts[1..]),
        "module" => {
            let rest = &parts[1..];
            match rest.split_first() {
                Some((TraversalPart::Attr(output), tail)) => {
                    let base = Expr::Ident(ident)
                        .member(format!("{}Output", camel_case(output)));
                    let access = apply_parts(ctx, base, tail);
                    maybe_coerce(ctx, access, expected, true)
                }
                _ => Expr::Ident(ident),
            }
        }
        "data" => construct_access(ctx, &node_id, ident, &parts[2..], expected),
        "resource" => construct_access(ctx, &node_id, ident, &parts[1..], expected),
        _ => Expr::Ident(ident),
    }
}

/// Attribute access on an emitted resource or data construct. Paths with
/// splats or computed indexes go through the `propertyAccess` projection
/// helper; plain chains become member access.
fn construct_access(
    ctx: &mut TranslateCtx,
    node_id: &str,
    ident: String,
    rest: &[TraversalPart],
    expected: &Expected,
) -> Expr {
    if rest.is_empty() {
        return Expr::Ident(ident);
    }
    let is_token = is_computed_attribute(ctx, node_id, rest);

    let needs_projection = rest
        .iter()
        .any(|p| matches!(p, TraversalPart::Splat | TraversalPart::IndexExpr(_)));
    let access = if needs_projection {
        ctx.imports.require_core();
        let mut path = Vec::with_capacity(rest.len());
        for part in rest {
            path.push(match part {
                TraversalPart::Attr(name) => Expr::Str(name.clone()),
                TraversalPart::Index(i) => Expr::Int(*i),
                TraversalPart::IndexExpr(key) => translate_expr(ctx, key, &Expected::None),
                TraversalPart::Splat => Expr::Str("*".to_string()),
            });
        }
        Expr::cdktf("propertyAccess").call(vec![Expr::Ident(ident), Expr::Array(path)])
    } else {
        apply_parts(ctx, Expr::Ident(ident), rest)
    };

    maybe_coerce(ctx, access, expected, is_token)
}

/// Whether the first accessed attribute is computed (or unknown, which is
/// treated as computed). Coercion only applies to computed references;
/// plain arguments echo their configured value.
fn is_computed_attribute(ctx: &TranslateCtx, node_id: &str, rest: &[TraversalPart]) -> bool {
    let mut segments = node_id.split('.');
    let kind = segments.next().unwrap_or_default();
    let resource_type = segments.next().unwrap_or_default();
    let Some(TraversalPart::Attr(first)) = rest.first() else {
        return true;
    };

    let provider = resource_type
        .split('_')
        .next()
        .unwrap_or(resource_type);
    let catalog = ctx.scope.catalog.clone();
    let bindings = ctx.scope.bindings.clone();
    let provider_bindings = bindings.get(&catalog, provider);
    let key = if kind == "data" {
        format!("data.{}", resource_type)
    } else {
        resource_type.to_string()
    };
    match provider_bindings.computed_attributes.get(&key) {
        Some(computed) => computed.contains(first.as_str()),
        None => true,
    }
}

fn apply_parts(ctx: &mut TranslateCtx, base: Expr, parts: &[TraversalPart]) -> Expr {
    parts
        .iter()
        .fold(base, |acc, part| apply_part(ctx, acc, part))
}

fn apply_part(ctx: &mut TranslateCtx, base: Expr, part: &TraversalPart) -> Expr {
    match part {
        TraversalPart::Attr(name) => {
            let camel = camel_case(name);
            if is_identifier(&camel) {
                base.member(camel)
            } else {
                Expr::Index(Box::new(base), Box::new(Expr::Str(name.clone())))
            }
        }
        TraversalPart::Index(i) => Expr::Index(Box::new(base), Box::new(Expr::Int(*i))),
        TraversalPart::IndexExpr(key) => {
            let key = translate_expr(ctx, key, &Expected::None);
            Expr::Index(Box::new(base), Box::new(key))
        }
        TraversalPart::Splat => {
            // Callers route splats through propertyAccess; a stray one
            // degrades to an explicit projection over the base.
            ctx.imports.require_core();
            Expr::cdktf("propertyAccess")
                .call(vec![base, Expr::Array(vec![Expr::Str("*".to_string())])])
        }
    }
}

fn iterator_access(
    ctx: &mut TranslateCtx,
    key_ident: &str,
    value_ident: &str,
    parts: &[TraversalPart],
) -> Expr {
    match parts.split_first() {
        Some((TraversalPart::Attr(attr), tail)) if attr == "key" => {
            apply_parts(ctx, Expr::Ident(key_ident.to_string()), tail)
        }
        Some((TraversalPart::Attr(attr), tail)) if attr == "value" => {
            apply_parts(ctx, Expr::Ident(value_ident.to_string()), tail)
        }
        _ => apply_parts(ctx, Expr::Ident(value_ident.to_string()), parts),
    }
}

fn is_intra_block(first: &str) -> bool {
    matches!(first, "count" | "each" | "self" | "path" | "terraform")
}

/// Rebuild the source-ish text of a reference for literal pass-through.
fn reference_source(base: &str, parts: &[TraversalPart]) -> String {
    let mut text = base.to_string();
    for part in parts {
        match part {
            TraversalPart::Attr(name) => {
                text.push('.');
                text.push_str(name);
            }
            TraversalPart::Index(i) => {
                text.push_str(&format!("[{}]", i));
            }
            TraversalPart::IndexExpr(_) => text.push_str("[...]"),
            TraversalPart::Splat => text.push_str("[*]"),
        }
    }
    text
}

// ─── Token coercion ─────────────────────────────────────────────────────────

/// Wrap a token-producing reference in the matching coercion helper when
/// the declared attribute type is more specific than "token".
fn maybe_coerce(ctx: &mut TranslateCtx, access: Expr, expected: &Expected, is_token: bool) -> Expr {
    if !is_token {
        return access;
    }
    let Expected::Type(t) = expected else {
        return access;
    };
    let helper = match t.kind() {
        TypeKind::String => "Token.asString",
        TypeKind::Number => "Token.asNumber",
        TypeKind::List(inner) | TypeKind::Set(inner) => match inner.kind() {
            TypeKind::Number => "Token.asNumberList",
            _ => "Token.asList",
        },
        TypeKind::Map(inner) => match inner.kind() {
            TypeKind::Number => "Token.asNumberMap",
            TypeKind::String => "Token.asStringMap",
            _ => "Token.asAnyMap",
        },
        _ => return access,
    };

    ctx.scope.mark_token_coercion();
    ctx.imports.require_core();
    Expr::cdktf(helper).call(vec![access])
}

// ─── Templates ──────────────────────────────────────────────────────────────

fn translate_template(ctx: &mut TranslateCtx, parts: &[TemplatePart]) -> Expr {
    if parts
        .iter()
        .all(|p| matches!(p, TemplatePart::Literal(_)))
    {
        let text: String = parts
            .iter()
            .map(|p| match p {
                TemplatePart::Literal(s) => s.as_str(),
                _ => "",
            })
            .collect();
        return Expr::Str(text);
    }

    let elems = parts
        .iter()
        .map(|part| match part {
            TemplatePart::Literal(s) => TemplateElem::Str(s.clone()),
            TemplatePart::Interpolation(inner) => {
                TemplateElem::Expr(translate_expr(ctx, inner, &Expected::None))
            }
        })
        .collect();
    Expr::Template(elems)
}

// ─── for-expressions ────────────────────────────────────────────────────────

fn translate_for(ctx: &mut TranslateCtx, expr: &Expression) -> Expr {
    let Expression::ForExpr {
        collection,
        key_var,
        val_var,
        key_expr,
        value_expr,
        condition,
        grouping,
    } = expr
    else {
        unreachable!("translate_for called on non-for expression");
    };

    if *grouping {
        ctx.diagnostics.push(Diagnostic::warning(
            "for-expression grouping (`...`) has no direct equivalent and was approximated",
        ));
    }

    let coll = translate_expr(ctx, collection, &Expected::None);
    let val = sanitize_identifier(val_var);

    match key_expr {
        // Object form: {for k, v in coll : key => value}
        Some(key_out) => {
            if let Some(key_in) = key_var {
                let key_in = sanitize_identifier(key_in);
                let params = format!("[{}, {}]", key_in, val);
                let mut chain = Expr::Ident("Object".to_string())
                    .member("entries")
                    .call(vec![coll]);
                if let Some(cond) = condition {
                    let cond = translate_expr(ctx, cond, &Expected::None);
                    chain = chain.member("filter").call(vec![Expr::Arrow {
                        params: params.clone(),
                        body: Box::new(cond),
                    }]);
                }
                let pair = Expr::Array(vec![
                    translate_expr(ctx, key_out, &Expected::None),
                    translate_expr(ctx, value_expr, &Expected::None),
                ]);
                chain = chain.member("map").call(vec![Expr::Arrow {
                    params,
                    body: Box::new(pair),
                }]);
                Expr::Ident("Object".to_string())
                    .member("fromEntries")
                    .call(vec![chain])
            } else {
                let mut chain = coll;
                if let Some(cond) = condition {
                    let cond = translate_expr(ctx, cond, &Expected::None);
                    chain = chain.member("filter").call(vec![Expr::Arrow {
                        params: val.clone(),
                        body: Box::new(cond),
                    }]);
                }
                let pair = Expr::Array(vec![
                    translate_expr(ctx, key_out, &Expected::None),
                    translate_expr(ctx, value_expr, &Expected::None),
                ]);
                chain = chain.member("map").call(vec![Expr::Arrow {
                    params: val,
                    body: Box::new(pair),
                }]);
                Expr::Ident("Object".to_string())
                    .member("fromEntries")
                    .call(vec![chain])
            }
        }
        // List form: [for v in coll : value] — the optional first variable
        // is the index, which maps to the callback's second parameter.
        None => {
            let params = match key_var {
                Some(idx) => format!("{}, {}", val, sanitize_identifier(idx)),
                None => val,
            };
            let mut chain = coll;
            if let Some(cond) = condition {
                let cond = translate_expr(ctx, cond, &Expected::None);
                chain = chain.member("filter").call(vec![Expr::Arrow {
                    params: params.clone(),
                    body: Box::new(cond),
                }]);
            }
            let body = translate_expr(ctx, value_expr, &Expected::None);
            chain.member("map").call(vec![Expr::Arrow {
                params,
                body: Box::new(body),
            }])
        }
    }
}

// ─── Dynamic blocks ─────────────────────────────────────────────────────────

/// Lower `dynamic "x" { for_each = ... content { ... } }` into an
/// iteration over the collection producing a list of content objects.
fn translate_dynamic(
    ctx: &mut TranslateCtx,
    dynamic: &crate::config::types::DynamicBlock,
    content_schema: Option<&SchemaBlock>,
) -> Expr {
    let for_each = translate_expr(ctx, &dynamic.for_each, &Expected::None);
    let iter_base = camel_case(&sanitize_identifier(&dynamic.iterator));
    let key_ident = format!("{}Key", iter_base);
    let value_ident = format!("{}Value", iter_base);

    ctx.iterators.push((
        dynamic.iterator.clone(),
        key_ident.clone(),
        value_ident.clone(),
    ));
    let mut entries = Vec::with_capacity(dynamic.content.len());
    for (key, value) in &dynamic.content {
        let value_expected = match content_schema {
            Some(block) => expected_for_block_entry(block, key),
            None => Expected::None,
        };
        let translated = translate_expr(ctx, value, &value_expected);
        let translated = wrap_block_list(value, &value_expected, translated);
        entries.push((camel_case(key), translated));
    }
    ctx.iterators.pop();

    let lambda = Expr::Arrow {
        params: format!("[{}, {}]", key_ident, value_ident),
        body: Box::new(Expr::Object(entries)),
    };
    Expr::Ident("Object".to_string())
        .member("entries")
        .call(vec![for_each])
        .member("map")
        .call(vec![lambda])
}
