use crate::error::ConvertError;

/// Known block types and their expected label counts, matching Terraform's
/// configFileSchema.
const BLOCK_SCHEMA: &[(&str, usize)] = &[
    ("resource", 2),
    ("data", 2),
    ("provider", 1),
    ("variable", 1),
    ("output", 1),
    ("module", 1),
    ("terraform", 0),
    ("locals", 0),
];

/// Validate a parsed HCL body against the Terraform block grammar.
///
/// Accepts extra unknown attributes *within* blocks (forward compatibility)
/// and missing optional blocks. Rejects top-level attributes, wrong label
/// counts, missing required fields, and more than one backend. Failure is
/// fatal; the error carries the structured path of the offending node.
pub fn validate(body: &hcl::Body) -> Result<(), ConvertError> {
    let mut backend_count = 0usize;

    for structure in body.iter() {
        match structure {
            hcl::Structure::Attribute(attr) => {
                // `provider = "aws"` and friends at the top level are a
                // shape error, not a forward-compat extension.
                return Err(conformance(
                    vec![attr.key.to_string()],
                    "a block",
                    "an attribute",
                ));
            }
            hcl::Structure::Block(block) => {
                let ident = block.identifier();
                let Some(&(_, labels)) = BLOCK_SCHEMA.iter().find(|&&(name, _)| name == ident)
                else {
                    tracing::debug!("ignoring unknown top-level block type: {}", ident);
                    continue;
                };

                let got = block.labels().len();
                if got != labels {
                    return Err(conformance(
                        block_path(block),
                        &format!("{} label(s)", labels),
                        &format!("{} label(s)", got),
                    ));
                }

                for label in block.labels() {
                    if label.as_str().is_empty() {
                        return Err(conformance(
                            block_path(block),
                            "a non-empty label",
                            "an empty label",
                        ));
                    }
                }

                match ident {
                    "module" => validate_module(block)?,
                    "terraform" => backend_count += validate_terraform(block)?,
                    _ => {}
                }
            }
        }
    }

    if backend_count > 1 {
        return Err(conformance(
            vec!["terraform".into(), "backend".into()],
            "at most one backend block",
            &format!("{} backend blocks", backend_count),
        ));
    }

    Ok(())
}

/// A module block must carry a `source` attribute.
fn validate_module(block: &hcl::Block) -> Result<(), ConvertError> {
    let has_source = block.body().iter().any(|s| {
        matches!(s, hcl::Structure::Attribute(attr) if &*attr.key == "source")
    });
    if !has_source {
        let mut path = block_path(block);
        path.push("source".into());
        return Err(conformance(path, "a source attribute", "nothing"));
    }
    Ok(())
}

/// Validate the terraform block; returns the number of backend blocks seen.
fn validate_terraform(block: &hcl::Block) -> Result<usize, ConvertError> {
    let mut backends = 0usize;
    for structure in block.body().iter() {
        if let hcl::Structure::Block(inner) = structure {
            match inner.identifier() {
                "backend" => {
                    if inner.labels().len() != 1 {
                        return Err(conformance(
                            vec!["terraform".into(), "backend".into()],
                            "1 label",
                            &format!("{} label(s)", inner.labels().len()),
                        ));
                    }
                    backends += 1;
                }
                "required_providers" => {
                    for s in inner.body().iter() {
                        if let hcl::Structure::Block(b) = s {
                            return Err(conformance(
                                vec![
                                    "terraform".into(),
                                    "required_providers".into(),
                                    b.identifier().to_string(),
                                ],
                                "an attribute",
                                "a block",
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(backends)
}

fn block_path(block: &hcl::Block) -> Vec<String> {
    let mut path = vec![block.identifier().to_string()];
    path.extend(block.labels().iter().map(|l| l.as_str().to_string()));
    path
}

fn conformance(path: Vec<String>, expected: &str, found: &str) -> ConvertError {
    ConvertError::SchemaConformance {
        path,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
