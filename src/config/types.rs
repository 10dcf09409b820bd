use std::fmt;

// ─── Parsed Plan ────────────────────────────────────────────────────────────

/// The validated top-level plan — everything the converter needs from a set
/// of .tf files. Collections are Vecs in source order; registration order
/// (and therefore output determinism) depends on it.
#[derive(Debug, Clone, Default)]
pub struct ParsedPlan {
    pub terraform: Option<TerraformSettings>,
    pub providers: Vec<ProviderBlock>,
    pub variables: Vec<VariableBlock>,
    pub locals: Vec<(String, Expression)>,
    pub modules: Vec<ModuleBlock>,
    pub resources: Vec<ResourceBlock>,
    pub data_sources: Vec<ResourceBlock>,
    pub outputs: Vec<OutputBlock>,
}

/// terraform {} block settings (backend, required_providers, required_version).
#[derive(Debug, Clone, Default)]
pub struct TerraformSettings {
    pub required_providers: Vec<(String, RequiredProvider)>,
    pub required_version: Option<String>,
    pub backend: Option<BackendBlock>,
}

#[derive(Debug, Clone)]
pub struct RequiredProvider {
    pub source: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendBlock {
    pub backend_type: String,
    pub attributes: Vec<(String, Expression)>,
}

// ─── Blocks ─────────────────────────────────────────────────────────────────

/// A provider configuration (e.g. provider "aws" { region = "us-east-1" }).
#[derive(Debug, Clone)]
pub struct ProviderBlock {
    pub name: String,
    pub alias: Option<String>,
    pub attributes: Vec<(String, Expression)>,
}

impl ProviderBlock {
    /// Node id: `provider.aws`, or `provider.aws.west` for aliased configs.
    pub fn node_id(&self) -> String {
        match &self.alias {
            Some(alias) => format!("provider.{}.{}", self.name, alias),
            None => format!("provider.{}", self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableBlock {
    pub name: String,
    pub var_type: Option<String>,
    pub default: Option<Expression>,
    pub description: Option<String>,
    pub sensitive: bool,
    pub nullable: Option<bool>,
    pub has_validation: bool,
}

#[derive(Debug, Clone)]
pub struct OutputBlock {
    pub name: String,
    pub value: Expression,
    pub description: Option<String>,
    pub sensitive: bool,
    pub depends_on: Vec<String>,
}

/// A module invocation.
#[derive(Debug, Clone)]
pub struct ModuleBlock {
    pub name: String,
    pub source: String,
    pub version: Option<String>,
    pub depends_on: Vec<String>,
    pub arguments: Vec<(String, Expression)>,
}

impl ModuleBlock {
    /// Registry sources look like `namespace/name/provider`; everything
    /// starting with `./`, `../`, an absolute path, or a go-getter prefix
    /// is treated as local/opaque.
    pub fn is_registry_source(&self) -> bool {
        !(self.source.starts_with("./")
            || self.source.starts_with("../")
            || self.source.starts_with('/')
            || self.source.contains("::"))
    }
}

/// A resource or data source block (data sources carry the same shape).
#[derive(Debug, Clone)]
pub struct ResourceBlock {
    pub resource_type: String,
    pub name: String,
    pub provider_ref: Option<String>,
    pub count: Option<Expression>,
    pub for_each: Option<Expression>,
    pub depends_on: Vec<String>,
    pub lifecycle: Option<LifecycleBlock>,
    pub attributes: Vec<(String, Expression)>,
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleBlock {
    pub create_before_destroy: bool,
    pub prevent_destroy: bool,
    pub ignore_changes: Vec<String>,
}

/// An HCL `dynamic "name" { for_each = ... content { ... } }` block.
#[derive(Debug, Clone)]
pub struct DynamicBlock {
    pub name: String,
    pub iterator: String,
    pub for_each: Expression,
    pub content: Vec<(String, Expression)>,
}

// ─── Expression IR ──────────────────────────────────────────────────────────

/// A scalar literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Expression represents any value or computation in a Terraform config.
/// Arrays and objects keep their element expressions so references nested
/// inside them survive to discovery and emission.
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Value),
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),

    /// A bare identifier — the base of a traversal, a type keyword like
    /// `string`, or a reserved name like `count`.
    Variable(String),

    /// A traversal like `aws_vpc.main.subnets[0].id` or `var.region`.
    Traversal {
        base: Box<Expression>,
        parts: Vec<TraversalPart>,
    },

    /// A function call like `cidrsubnet(var.cidr, 8, 1)`.
    FunctionCall { name: String, args: Vec<Expression> },

    /// Ternary: condition ? true_val : false_val.
    Conditional {
        condition: Box<Expression>,
        true_val: Box<Expression>,
        false_val: Box<Expression>,
    },

    BinaryOp {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    UnaryOp {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// for expression: `[for x in list : transform if cond]` or the object
    /// form `{for k, v in map : k => v}`.
    ForExpr {
        collection: Box<Expression>,
        key_var: Option<String>,
        val_var: String,
        key_expr: Option<Box<Expression>>,
        value_expr: Box<Expression>,
        condition: Option<Box<Expression>>,
        grouping: bool,
    },

    /// String template with interpolations: "Hello ${var.name}".
    Template(Vec<TemplatePart>),

    /// Heredoc body; indent stripping for `<<-` is applied at parse time.
    Heredoc(Vec<TemplatePart>),

    /// A dynamic block hoisted into the owning block's attribute list.
    Dynamic(Box<DynamicBlock>),
}

#[derive(Debug, Clone)]
pub enum TraversalPart {
    /// `.name`
    Attr(String),
    /// `[0]`
    Index(i64),
    /// `[expr]` where the key is not a literal integer.
    IndexExpr(Box<Expression>),
    /// `[*]` or `.*`
    Splat,
}

#[derive(Debug, Clone)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinOp {
    /// The operator's spelling in the reference target language.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "===",
            BinOp::NotEq => "!==",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::Gt => ">",
            BinOp::Gte => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl Expression {
    pub fn string(s: impl Into<String>) -> Self {
        Expression::Literal(Value::String(s.into()))
    }

    pub fn null() -> Self {
        Expression::Literal(Value::Null)
    }

    /// The leading dotted names of a traversal, e.g.
    /// `aws_vpc.main.subnets[0].id` → ["aws_vpc", "main", "subnets"].
    /// Stops at the first non-attribute operator. Returns None for
    /// expressions that are not name-rooted traversals.
    pub fn leading_names(&self) -> Option<Vec<&str>> {
        match self {
            Expression::Variable(name) => Some(vec![name.as_str()]),
            Expression::Traversal { base, parts } => {
                let Expression::Variable(first) = base.as_ref() else {
                    return None;
                };
                let mut names = vec![first.as_str()];
                for part in parts {
                    match part {
                        TraversalPart::Attr(name) => names.push(name.as_str()),
                        _ => break,
                    }
                }
                Some(names)
            }
            _ => None,
        }
    }
}
