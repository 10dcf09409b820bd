use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::config::types::{Expression, ParsedPlan, TemplatePart, TraversalPart};
use crate::error::ConvertError;

/// The kind of top-level block a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Provider,
    Variable,
    Local,
    Module,
    Resource,
    Data,
    Output,
}

/// One top-level block, registered as a node of the conversion graph.
/// `index` points back into the matching ParsedPlan collection.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub kind: BlockKind,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Inferred from an expression reference.
    Implicit,
    /// Declared via `depends_on`.
    Explicit,
    /// A `provider = aws.west` attribute.
    Provider,
}

/// Reference prefixes that are intra-block and must never create edges.
const RESERVED_PREFIXES: &[&str] = &["count", "each", "self", "path", "terraform"];

/// The dependency graph over registered nodes. Node indices follow
/// registration order, which drives emission tie-breaking.
#[derive(Debug, Default)]
pub struct ConversionGraph {
    pub graph: DiGraph<GraphNode, EdgeKind>,
    ids: HashMap<String, NodeIndex>,
}

impl ConversionGraph {
    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn lookup(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    fn register(&mut self, id: String, kind: BlockKind, index: usize) {
        if self.ids.contains_key(&id) {
            tracing::debug!("node {} registered twice, keeping first", id);
            return;
        }
        let idx = self.graph.add_node(GraphNode {
            id: id.clone(),
            kind,
            index,
        });
        self.ids.insert(id, idx);
    }

    /// Add an edge referencee → referencer. The target is looked up by the
    /// caller; a missing target here is a discovery bug, not user error.
    fn add_edge(&mut self, from_id: &str, to: NodeIndex, kind: EdgeKind) -> Result<(), ConvertError> {
        let Some(&from) = self.ids.get(from_id) else {
            return Err(ConvertError::MissingNode {
                id: from_id.to_string(),
            });
        };
        if from == to {
            // Intra-node self-references are not cycles.
            return Ok(());
        }
        self.graph.add_edge(from, to, kind);
        Ok(())
    }
}

/// Build the conversion graph: register every node first, then discover
/// edges, so forward references resolve regardless of block order.
pub fn build_graph(plan: &ParsedPlan) -> Result<ConversionGraph, ConvertError> {
    let mut cg = ConversionGraph::default();

    for (i, provider) in plan.providers.iter().enumerate() {
        cg.register(provider.node_id(), BlockKind::Provider, i);
    }
    for (i, variable) in plan.variables.iter().enumerate() {
        cg.register(format!("var.{}", variable.name), BlockKind::Variable, i);
    }
    for (i, (name, _)) in plan.locals.iter().enumerate() {
        cg.register(format!("local.{}", name), BlockKind::Local, i);
    }
    for (i, module) in plan.modules.iter().enumerate() {
        cg.register(format!("module.{}", module.name), BlockKind::Module, i);
    }
    for (i, resource) in plan.resources.iter().enumerate() {
        cg.register(
            format!("resource.{}.{}", resource.resource_type, resource.name),
            BlockKind::Resource,
            i,
        );
    }
    for (i, data) in plan.data_sources.iter().enumerate() {
        cg.register(
            format!("data.{}.{}", data.resource_type, data.name),
            BlockKind::Data,
            i,
        );
    }
    for (i, output) in plan.outputs.iter().enumerate() {
        cg.register(format!("out.{}", output.name), BlockKind::Output, i);
    }

    discover_edges(plan, &mut cg)?;
    Ok(cg)
}

fn discover_edges(plan: &ParsedPlan, cg: &mut ConversionGraph) -> Result<(), ConvertError> {
    // Iterate a snapshot of indices; discovery never adds nodes.
    for idx in cg.graph.node_indices().collect::<Vec<_>>() {
        let node = cg.graph[idx].clone();
        match node.kind {
            BlockKind::Provider => {
                let provider = &plan.providers[node.index];
                for (_, expr) in provider.attributes.clone() {
                    connect_references(&expr, idx, cg)?;
                }
            }
            BlockKind::Variable => {
                // Variable defaults must be literal; nothing to discover.
            }
            BlockKind::Local => {
                let (_, expr) = plan.locals[node.index].clone();
                connect_references(&expr, idx, cg)?;
            }
            BlockKind::Module => {
                let module = plan.modules[node.index].clone();
                for (_, expr) in &module.arguments {
                    connect_references(expr, idx, cg)?;
                }
                connect_depends_on(&module.depends_on, idx, cg)?;
            }
            BlockKind::Resource | BlockKind::Data => {
                let block = match node.kind {
                    BlockKind::Resource => plan.resources[node.index].clone(),
                    _ => plan.data_sources[node.index].clone(),
                };
                for (_, expr) in &block.attributes {
                    connect_references(expr, idx, cg)?;
                }
                if let Some(count) = &block.count {
                    connect_references(count, idx, cg)?;
                }
                if let Some(for_each) = &block.for_each {
                    connect_references(for_each, idx, cg)?;
                }
                connect_depends_on(&block.depends_on, idx, cg)?;
                if let Some(provider_ref) = &block.provider_ref {
                    // `provider = aws.west` → provider.aws.west
                    let id = format!("provider.{}", provider_ref);
                    if cg.lookup(&id).is_some() {
                        cg.add_edge(&id, idx, EdgeKind::Provider)?;
                    } else {
                        tracing::debug!("provider reference {} not registered", id);
                    }
                }
            }
            BlockKind::Output => {
                let output = plan.outputs[node.index].clone();
                connect_references(&output.value, idx, cg)?;
                connect_depends_on(&output.depends_on, idx, cg)?;
            }
        }
    }
    Ok(())
}

fn connect_depends_on(
    deps: &[String],
    to: NodeIndex,
    cg: &mut ConversionGraph,
) -> Result<(), ConvertError> {
    for dep in deps {
        let names: Vec<&str> = dep.split('.').collect();
        match resolve_reference(&names, cg) {
            Some(id) => cg.add_edge(&id, to, EdgeKind::Explicit)?,
            None => tracing::debug!("depends_on target {} not registered, dropping", dep),
        }
    }
    Ok(())
}

/// Walk an expression, adding an Implicit edge for every reference that
/// resolves to a registered node. Unresolved references are dropped with a
/// debug log and stay literal in the emitted code.
fn connect_references(
    expr: &Expression,
    to: NodeIndex,
    cg: &mut ConversionGraph,
) -> Result<(), ConvertError> {
    let mut refs = Vec::new();
    collect_references(expr, &mut refs);
    for names in refs {
        match resolve_reference(&names.iter().map(|s| s.as_str()).collect::<Vec<_>>(), cg) {
            Some(id) => cg.add_edge(&id, to, EdgeKind::Implicit)?,
            None => tracing::debug!("reference {} not registered, dropping", names.join(".")),
        }
    }
    Ok(())
}

/// Resolve dotted names to a node id by longest-prefix match:
/// `aws_vpc.main.subnets` resolves to `resource.aws_vpc.main`.
pub fn resolve_reference(names: &[&str], cg: &ConversionGraph) -> Option<String> {
    let first = *names.first()?;
    if RESERVED_PREFIXES.contains(&first) {
        return None;
    }

    let candidate = match first {
        "var" | "local" | "module" => {
            let name = names.get(1)?;
            format!("{}.{}", first, name)
        }
        "data" => {
            let data_type = names.get(1)?;
            let name = names.get(2)?;
            format!("data.{}.{}", data_type, name)
        }
        _ => {
            let name = names.get(1)?;
            format!("resource.{}.{}", first, name)
        }
    };

    cg.lookup(&candidate).map(|_| candidate)
}

/// Collect the dotted name paths of every reference in an expression.
pub fn collect_references(expr: &Expression, refs: &mut Vec<Vec<String>>) {
    match expr {
        Expression::Variable(_) | Expression::Traversal { .. } => {
            if let Some(names) = expr.leading_names() {
                if names.len() >= 2 {
                    refs.push(names.iter().map(|s| s.to_string()).collect());
                }
            }
            if let Expression::Traversal { base, parts } = expr {
                if expr.leading_names().is_none() {
                    collect_references(base, refs);
                }
                for part in parts {
                    if let TraversalPart::IndexExpr(key) = part {
                        collect_references(key, refs);
                    }
                }
            }
        }
        Expression::Literal(_) => {}
        Expression::Array(items) => {
            for item in items {
                collect_references(item, refs);
            }
        }
        Expression::Object(entries) => {
            for (_, value) in entries {
                collect_references(value, refs);
            }
        }
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                collect_references(arg, refs);
            }
        }
        Expression::Conditional {
            condition,
            true_val,
            false_val,
        } => {
            collect_references(condition, refs);
            collect_references(true_val, refs);
            collect_references(false_val, refs);
        }
        Expression::BinaryOp { left, right, .. } => {
            collect_references(left, refs);
            collect_references(right, refs);
        }
        Expression::UnaryOp { operand, .. } => collect_references(operand, refs),
        Expression::ForExpr {
            collection,
            key_expr,
            value_expr,
            condition,
            ..
        } => {
            collect_references(collection, refs);
            if let Some(k) = key_expr {
                collect_references(k, refs);
            }
            collect_references(value_expr, refs);
            if let Some(c) = condition {
                collect_references(c, refs);
            }
        }
        Expression::Template(parts) | Expression::Heredoc(parts) => {
            for part in parts {
                if let TemplatePart::Interpolation(inner) = part {
                    collect_references(inner, refs);
                }
            }
        }
        Expression::Dynamic(dynamic) => {
            collect_references(&dynamic.for_each, refs);
            for (_, value) in &dynamic.content {
                // References to the iterator are intra-block; everything
                // else in the content participates normally.
                collect_non_iterator_references(value, &dynamic.iterator, refs);
            }
        }
    }
}

fn collect_non_iterator_references(expr: &Expression, iterator: &str, refs: &mut Vec<Vec<String>>) {
    let mut inner = Vec::new();
    collect_references(expr, &mut inner);
    for names in inner {
        if names.first().map(|n| n.as_str()) != Some(iterator) {
            refs.push(names);
        }
    }
}
