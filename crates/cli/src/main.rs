use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reshape_engine::JsonTransformer;

#[derive(Parser)]
#[command(name = "reshape", version, about = "Declarative JSON-to-JSON transformation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform a source document with a template
    Transform {
        /// Path to the template JSON
        #[arg(long, short = 't')]
        template: PathBuf,
        /// Path to the source JSON; stdin when omitted
        #[arg(long, short = 's')]
        source: Option<PathBuf>,
        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a template and report every finding
    Validate {
        /// Path to the template JSON
        #[arg(long, short = 't')]
        template: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Transform { template, source, pretty } => {
            let template_text = read_file(&template)?;
            let source_text = match source {
                Some(path) => read_file(&path)?,
                None => read_stdin()?,
            };

            let transformer = JsonTransformer::from_json(&template_text)?;
            let output = transformer.transform(&source_text)?;
            if pretty {
                let value: serde_json::Value = serde_json::from_str(&output)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{output}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { template } => {
            let template_text = read_file(&template)?;
            let findings = reshape_engine::validate_template(&template_text);
            for finding in &findings {
                println!("{finding}");
            }
            if findings.iter().any(|finding| finding.starts_with("error:")) {
                return Ok(ExitCode::FAILURE);
            }
            println!("template is valid ({} warning(s))", findings.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
    Ok(buffer)
}
