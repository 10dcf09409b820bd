use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::schema::registry::RegistryClient;
use crate::schema::types::{ModuleCatalog, ModuleMeta, ProviderSchemaCatalog};

/// A provider the caller wants schema for.
#[derive(Debug, Clone)]
pub struct ProviderTarget {
    /// Registry source, e.g. "hashicorp/aws".
    pub source: String,
    /// Version constraint, if any.
    pub version: Option<String>,
}

impl ProviderTarget {
    /// Parse "hashicorp/aws@~> 4.0" / "aws" forms.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('@') {
            Some((source, version)) => Self {
                source: source.to_string(),
                version: Some(version.to_string()),
            },
            None => Self {
                source: spec.to_string(),
                version: None,
            },
        }
    }

    /// Short provider name: last path segment of the source.
    pub fn name(&self) -> &str {
        self.source.rsplit('/').next().unwrap_or(&self.source)
    }
}

/// Fetch provider schemas and module metadata for the given targets.
///
/// Providers are resolved by writing a minimal configuration into a scratch
/// directory, running `terraform init` there, and capturing
/// `terraform providers schema -json`. Registry modules without a version
/// pin are resolved against the registry. This is the only place the crate
/// performs I/O on behalf of a conversion.
pub async fn read_schema(
    provider_targets: &[ProviderTarget],
    module_sources: &[String],
) -> Result<(ProviderSchemaCatalog, ModuleCatalog)> {
    let providers = if provider_targets.is_empty() {
        ProviderSchemaCatalog::empty()
    } else {
        fetch_provider_schemas(provider_targets).await?
    };

    let mut modules = ModuleCatalog::empty();
    let registry = RegistryClient::new();
    for source in module_sources {
        let version = match registry.module_latest_version(source).await {
            Ok(v) => Some(v),
            Err(err) => {
                debug!("could not resolve module {}: {}", source, err);
                None
            }
        };
        modules
            .modules
            .insert(source.clone(), ModuleMeta { version });
    }

    Ok((providers, modules))
}

async fn fetch_provider_schemas(targets: &[ProviderTarget]) -> Result<ProviderSchemaCatalog> {
    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    write_requirements(scratch.path(), targets)?;

    info!(
        "Fetching schema for {} provider(s) (this may take a moment)...",
        targets.len()
    );
    run_terraform(scratch.path(), &["init", "-backend=false", "-no-color"]).await?;
    let json = run_terraform(scratch.path(), &["providers", "schema", "-json"]).await?;

    serde_json::from_str(&json).context("Failed to parse `terraform providers schema` output")
}

/// Write a main.tf.json declaring the required providers.
fn write_requirements(dir: &Path, targets: &[ProviderTarget]) -> Result<()> {
    let mut required = serde_json::Map::new();
    for target in targets {
        let mut entry = serde_json::Map::new();
        entry.insert("source".into(), serde_json::Value::String(target.source.clone()));
        if let Some(version) = &target.version {
            entry.insert("version".into(), serde_json::Value::String(version.clone()));
        }
        required.insert(target.name().to_string(), serde_json::Value::Object(entry));
    }
    let doc = serde_json::json!({
        "terraform": { "required_providers": required }
    });

    std::fs::write(
        dir.join("main.tf.json"),
        serde_json::to_string_pretty(&doc)?,
    )
    .context("Failed to write provider requirements")?;
    Ok(())
}

async fn run_terraform(dir: &Path, args: &[&str]) -> Result<String> {
    debug!("running terraform {:?} in {}", args, dir.display());
    let output = Command::new("terraform")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .context("Failed to start terraform — is it installed and on PATH?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "terraform {} failed with {}:\n{}",
            args.first().unwrap_or(&""),
            output.status,
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
