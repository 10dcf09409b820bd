use std::fmt::Write as _;

/// A language-neutral expression. Rendering targets the reference surface
/// syntax (TypeScript); other languages are produced by the lowering
/// backend from the rendered reference source.
#[derive(Debug, Clone)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Interpolated string, rendered as a template literal.
    Template(Vec<TemplateElem>),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    New { class: String, args: Vec<Expr> },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    /// Single-expression lambda. `params` is rendered verbatim, which lets
    /// callers use destructuring parameter lists.
    Arrow { params: String, body: Box<Expr> },
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: &'static str, operand: Box<Expr> },
    Ternary {
        cond: Box<Expr>,
        then_val: Box<Expr>,
        else_val: Box<Expr>,
    },
    /// Escape hatch for text kept literally (unresolved references).
    Raw(String),
}

#[derive(Debug, Clone)]
pub enum TemplateElem {
    Str(String),
    Expr(Expr),
}

impl Expr {
    pub fn member(self, name: impl Into<String>) -> Expr {
        Expr::Member(Box::new(self), name.into())
    }

    pub fn call(self, args: Vec<Expr>) -> Expr {
        Expr::Call(Box::new(self), args)
    }

    /// `cdktf.<path>` member chain.
    pub fn cdktf(path: &str) -> Expr {
        path.split('.')
            .fold(Expr::Ident("cdktf".to_string()), |acc, seg| acc.member(seg))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        match self {
            Expr::Null => out.push_str("null"),
            Expr::Bool(b) => {
                let _ = write!(out, "{}", b);
            }
            Expr::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Expr::Float(f) => {
                let _ = write!(out, "{}", f);
            }
            Expr::Str(s) => {
                out.push('"');
                escape_into(s, out);
                out.push('"');
            }
            Expr::Template(elems) => {
                out.push('`');
                for elem in elems {
                    match elem {
                        TemplateElem::Str(s) => escape_template_into(s, out),
                        TemplateElem::Expr(e) => {
                            out.push_str("${");
                            e.write(out);
                            out.push('}');
                        }
                    }
                }
                out.push('`');
            }
            Expr::Ident(name) => out.push_str(name),
            Expr::Member(object, name) => {
                object.write(out);
                out.push('.');
                out.push_str(name);
            }
            Expr::Index(object, index) => {
                object.write(out);
                out.push('[');
                index.write(out);
                out.push(']');
            }
            Expr::Call(callee, args) => {
                callee.write(out);
                out.push('(');
                write_list(args, out);
                out.push(')');
            }
            Expr::New { class, args } => {
                out.push_str("new ");
                out.push_str(class);
                out.push('(');
                write_list(args, out);
                out.push(')');
            }
            Expr::Array(items) => {
                out.push('[');
                write_list(items, out);
                out.push(']');
            }
            Expr::Object(entries) => {
                if entries.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{ ");
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if is_identifier(key) {
                        out.push_str(key);
                    } else {
                        out.push('"');
                        escape_into(key, out);
                        out.push('"');
                    }
                    out.push_str(": ");
                    value.write(out);
                }
                out.push_str(" }");
            }
            Expr::Arrow { params, body } => {
                out.push('(');
                out.push_str(params);
                out.push_str(") => ");
                match body.as_ref() {
                    // An object literal body needs parens to not read as a block.
                    Expr::Object(_) => {
                        out.push('(');
                        body.write(out);
                        out.push(')');
                    }
                    _ => body.write(out),
                }
            }
            Expr::Binary { op, left, right } => {
                left.write_operand(out);
                let _ = write!(out, " {} ", op);
                right.write_operand(out);
            }
            Expr::Unary { op, operand } => {
                out.push_str(op);
                operand.write_operand(out);
            }
            Expr::Ternary {
                cond,
                then_val,
                else_val,
            } => {
                cond.write_operand(out);
                out.push_str(" ? ");
                then_val.write_operand(out);
                out.push_str(" : ");
                else_val.write_operand(out);
            }
            Expr::Raw(text) => out.push_str(text),
        }
    }

    /// Write with parentheses when this expression would bind differently
    /// as an operand.
    fn write_operand(&self, out: &mut String) {
        match self {
            Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Arrow { .. } => {
                out.push('(');
                self.write(out);
                out.push(')');
            }
            _ => self.write(out),
        }
    }
}

fn write_list(items: &[Expr], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write(out);
    }
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}

fn escape_template_into(s: &str, out: &mut String) {
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A top-level statement in the emitted program body.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Comment text, one or more lines, without markers.
    Comment(String),
    Const { name: String, value: Expr },
    Expr(Expr),
}

impl Stmt {
    pub fn render(&self, indent: &str) -> String {
        match self {
            Stmt::Comment(text) => text
                .lines()
                .map(|line| format!("{}// {}", indent, line))
                .collect::<Vec<_>>()
                .join("\n"),
            Stmt::Const { name, value } => {
                format!("{}const {} = {};", indent, name, value.render())
            }
            Stmt::Expr(expr) => format!("{}{};", indent, expr.render()),
        }
    }
}

/// Render a statement list, one per line.
pub fn render_statements(stmts: &[Stmt], indent: &str) -> String {
    stmts
        .iter()
        .map(|s| s.render(indent))
        .collect::<Vec<_>>()
        .join("\n")
}
