use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::generator::BindingsCache;
use crate::schema::types::{ModuleCatalog, ProviderSchemaCatalog};

/// Reserved words of the reference target language; never used verbatim as
/// a generated identifier.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

/// Per-conversion workspace: the schema handles plus all naming state.
/// Nothing in here survives the conversion; the bindings cache behind
/// `bindings` is the only piece shared across calls.
pub struct Scope {
    pub catalog: Arc<ProviderSchemaCatalog>,
    pub modules: Arc<ModuleCatalog>,
    pub bindings: Arc<BindingsCache>,
    /// Identifiers already used in the emitted program.
    constructs: HashSet<String>,
    /// Logical node id → emitted identifier.
    variables: HashMap<String, String>,
    has_token_coercion: bool,
}

impl Scope {
    pub fn new(
        catalog: Arc<ProviderSchemaCatalog>,
        modules: Arc<ModuleCatalog>,
        bindings: Arc<BindingsCache>,
    ) -> Self {
        Self {
            catalog,
            modules,
            bindings,
            constructs: HashSet::new(),
            variables: HashMap::new(),
            has_token_coercion: false,
        }
    }

    /// Allocate (or return the already-allocated) identifier for a node.
    /// Conflicts — including HCL names differing only by case, which
    /// collapse under camel-casing — resolve by appending `_1`, `_2`, …
    /// in registration order.
    pub fn declare(&mut self, node_id: &str, preferred: &str) -> String {
        if let Some(existing) = self.variables.get(node_id) {
            return existing.clone();
        }

        let base = sanitize_identifier(&camel_case(preferred));
        let mut candidate = base.clone();
        let mut counter = 0usize;
        while self.constructs.contains(&candidate) || RESERVED_WORDS.contains(&candidate.as_str())
        {
            counter += 1;
            candidate = format!("{}_{}", base, counter);
        }

        self.constructs.insert(candidate.clone());
        self.variables
            .insert(node_id.to_string(), candidate.clone());
        candidate
    }

    /// The identifier previously allocated for a node, if any.
    pub fn identifier(&self, node_id: &str) -> Option<&str> {
        self.variables.get(node_id).map(|s| s.as_str())
    }

    pub fn mark_token_coercion(&mut self) {
        self.has_token_coercion = true;
    }

    pub fn has_token_coercion(&self) -> bool {
        self.has_token_coercion
    }
}

/// Replace characters invalid in an identifier with `_`, prefixing one if
/// the name starts with a digit or is empty.
pub fn sanitize_identifier(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        cleaned.insert(0, '_');
    }
    debug_assert!(identifier_re().is_match(&cleaned));
    cleaned
}

/// snake_case / kebab-case → camelCase with a lowercase first letter.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, ch) in name.chars().enumerate() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = true;
            continue;
        }
        if i == 0 {
            out.extend(ch.to_lowercase());
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// snake_case → PascalCase.
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing() {
        assert_eq!(camel_case("cidr_block"), "cidrBlock");
        assert_eq!(camel_case("Main"), "main");
        assert_eq!(camel_case("a"), "a");
        assert_eq!(pascal_case("aws_vpc"), "AwsVpc");
        assert_eq!(pascal_case("null_resource"), "NullResource");
        assert_eq!(pascal_case("s3"), "S3");
    }

    #[test]
    fn sanitizing() {
        assert_eq!(sanitize_identifier("my-name"), "my_name");
        assert_eq!(sanitize_identifier("3tier"), "_3tier");
        assert_eq!(sanitize_identifier(""), "_");
    }
}
