use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Reset SIGPIPE to default behavior so piping (e.g. `cdkconv convert | head`)
/// exits cleanly instead of panicking on broken pipe.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod codegen;
mod config;
mod convert;
mod dag;
mod error;
mod hcl;
mod lowering;
mod schema;

use convert::{convert, ConvertOptions};
use lowering::Language;
use schema::loader::{read_schema, ProviderTarget};
use schema::types::ProviderSchemaCatalog;

/// cdkconv - convert Terraform HCL into CDKTF programs
#[derive(Parser)]
#[command(name = "cdkconv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a .tf file or a directory of .tf files
    Convert {
        /// Input file or directory
        input: PathBuf,

        /// Target language: typescript, python, java, csharp, go
        #[arg(short, long, default_value = "typescript")]
        language: String,

        /// Provider schema catalog (output of `terraform providers schema
        /// -json`, or of `cdkconv schema`)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write the converted program here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on lowering errors instead of returning best-effort output
        #[arg(long)]
        strict: bool,
    },

    /// Fetch provider schemas and cache them for offline conversion
    Schema {
        /// Providers to fetch, e.g. "hashicorp/aws@~> 5.0" (repeatable)
        #[arg(short, long = "provider", required = true)]
        providers: Vec<String>,

        /// Where to write the catalog JSON
        #[arg(short, long, default_value = "schema.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("cdkconv=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cdkconv=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            language,
            schema,
            output,
            strict,
        } => cmd_convert(&input, &language, schema.as_deref(), output.as_deref(), strict),
        Commands::Schema { providers, output } => cmd_schema(&providers, &output).await,
    }
}

fn cmd_convert(
    input: &Path,
    language: &str,
    schema: Option<&Path>,
    output: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let language = Language::from_str(language)?;

    let source = if input.is_dir() {
        hcl::read_directory(input)?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    let catalog: ProviderSchemaCatalog = match schema {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse schema {}", path.display()))?
        }
        None => {
            tracing::warn!("no --schema given; conversion runs without provider schemas");
            ProviderSchemaCatalog::empty()
        }
    };

    let mut options = ConvertOptions::new(language, Arc::new(catalog));
    options.throw_on_translation_error = strict;

    let result = convert(&source, &options)?;

    for diagnostic in &result.diagnostics {
        eprintln!("{} {}", "!".yellow().bold(), diagnostic);
    }

    match output {
        Some(path) => {
            std::fs::write(path, &result.all)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Converted {} line(s) to {} ({} provider(s), {} module(s))",
                "✓".green().bold(),
                result.stats.converted_lines,
                path.display(),
                result.stats.number_of_providers,
                result.stats.number_of_modules
            );
        }
        None => print!("{}", result.all),
    }
    Ok(())
}

async fn cmd_schema(providers: &[String], output: &Path) -> Result<()> {
    let targets: Vec<ProviderTarget> = providers.iter().map(|p| ProviderTarget::parse(p)).collect();
    let (catalog, _modules) = read_schema(&targets, &[]).await?;

    std::fs::write(output, serde_json::to_string_pretty(&catalog)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} Wrote schema for {} provider(s) to {}",
        "✓".green().bold(),
        catalog.provider_schemas.len(),
        output.display()
    );
    Ok(())
}
