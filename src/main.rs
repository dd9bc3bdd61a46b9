//! docx-blocks CLI - extract, validate and rebuild .docx documents

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use docx_blocks::{
    CodecConfig, Document, extract_file, reconstruct_document_with, validate_candidate_str,
};

#[derive(Parser)]
#[command(name = "docx-blocks")]
#[command(version)]
#[command(about = "Edit .docx documents through a JSON block model", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document into block JSON
    Extract {
        /// Input .docx file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Check edited block JSON against the original extraction
    Validate {
        /// Edited block JSON
        #[arg(value_name = "FILE")]
        candidate: PathBuf,

        /// Block JSON extracted from the original document
        #[arg(long, value_name = "FILE")]
        original: PathBuf,
    },

    /// Rebuild a document from edited block JSON
    Reconstruct {
        /// Original .docx file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Block JSON extracted from the original document
        #[arg(long, value_name = "FILE")]
        original: PathBuf,

        /// Edited block JSON
        #[arg(long, value_name = "FILE")]
        candidate: PathBuf,

        /// Output .docx file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Write the default configuration file
    InitConfig,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
        } => cmd_extract(&load_config(config_path)?, &input, output.as_deref(), compact),
        Commands::Validate {
            candidate,
            original,
        } => cmd_validate(&load_config(config_path)?, &candidate, &original),
        Commands::Reconstruct {
            input,
            original,
            candidate,
            output,
        } => cmd_reconstruct(
            &load_config(config_path)?,
            &input,
            &original,
            &candidate,
            &output,
        ),
        Commands::InitConfig => cmd_init_config(config_path),
    }
}

fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => CodecConfig::load().context("Failed to load config"),
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid block JSON in {}", path.display()))
}

fn cmd_extract(
    config: &CodecConfig,
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<ExitCode> {
    let document =
        extract_file(input).with_context(|| format!("Failed to extract {}", input.display()))?;
    let json = document.to_json(config.pretty_json && !compact)?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!(
                "wrote {} blocks ({} tables) to {}",
                document.metadata.block_count,
                document.metadata.table_count,
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(config: &CodecConfig, candidate: &Path, original: &Path) -> Result<ExitCode> {
    let original = read_document(original)?;
    let candidate = fs::read_to_string(candidate)
        .with_context(|| format!("Failed to read {}", candidate.display()))?;

    let report = validate_candidate_str(&candidate, &original, &config.validation_options());
    let json = if config.pretty_json {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_reconstruct(
    config: &CodecConfig,
    input: &Path,
    original: &Path,
    candidate: &Path,
    output: &Path,
) -> Result<ExitCode> {
    let original = read_document(original)?;
    let candidate_json = fs::read_to_string(candidate)
        .with_context(|| format!("Failed to read {}", candidate.display()))?;

    let report = validate_candidate_str(&candidate_json, &original, &config.validation_options());
    if !report.valid {
        for error in &report.errors {
            eprintln!("  {error}");
        }
        bail!(
            "Candidate {} failed validation with {} error(s)",
            candidate.display(),
            report.errors.len()
        );
    }
    let candidate: Document = serde_json::from_str(&candidate_json)
        .with_context(|| format!("Invalid block JSON in {}", candidate.display()))?;

    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let options = config.reconstruct_options();
    let rebuilt = reconstruct_document_with(&bytes, &original, &candidate, &options)
        .with_context(|| format!("Failed to rebuild {}", input.display()))?;
    fs::write(output, rebuilt).with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("wrote {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_init_config(path: Option<&Path>) -> Result<ExitCode> {
    match path {
        Some(path) => CodecConfig::default().save_to(path)?,
        None => CodecConfig::init_default()?,
    }
    let shown = path
        .map(Path::to_path_buf)
        .or_else(CodecConfig::get_config_path)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "config directory".to_string());
    println!("Wrote default configuration to {shown}");
    Ok(ExitCode::SUCCESS)
}
