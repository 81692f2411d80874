use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use registrable_contracts::choices::{CheckError, DeferredChecks, Scalar};
use registrable_contracts::manifest::{choices_diff, read_choices, write_choices, ChoiceManifest};
use registrable_contracts::models::{DeclaredModel, ModelChoiceRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "registrable", version, about = "Inspect registrable choice manifests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Show(ShowArgs),
    Check(CheckArgs),
    Lookup(LookupArgs),
}

#[derive(Debug, Parser)]
struct ShowArgs {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long)]
    expected: PathBuf,
}

#[derive(Debug, Parser)]
struct LookupArgs {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long)]
    value: String,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("registrable error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Show(args) => run_show(&args),
        Command::Check(args) => run_check(&args),
        Command::Lookup(args) => run_lookup(&args),
    }
}

fn load_registry(path: &Path) -> Result<(ModelChoiceRegistry<DeclaredModel>, Vec<CheckError>)> {
    let manifest = ChoiceManifest::load(path)?;
    let checks = Arc::new(DeferredChecks::new());
    let registry = manifest.build(checks.clone());
    let errors = checks.take();
    for error in &errors {
        eprintln!("check: {error}");
    }
    tracing::info!(
        manifest = %path.display(),
        choices = registry.choices().len(),
        errors = errors.len(),
        "loaded choice manifest"
    );
    Ok((registry, errors))
}

fn run_show(args: &ShowArgs) -> Result<i32> {
    let (registry, _) = load_registry(&args.manifest)?;
    match &args.out {
        Some(out) => write_choices(out, registry.choices())?,
        None => println!("{}", serde_json::to_string_pretty(registry.choices())?),
    }
    Ok(0)
}

fn run_check(args: &CheckArgs) -> Result<i32> {
    let (registry, errors) = load_registry(&args.manifest)?;
    let expected = read_choices(&args.expected)?;
    let actual = registry.iter().collect::<Vec<_>>();
    let diff = choices_diff(&expected, &actual)?;
    if let Some(lines) = &diff {
        for line in lines {
            println!("{line}");
        }
    }
    if diff.is_none() && errors.is_empty() {
        return Ok(0);
    }
    Ok(1)
}

fn run_lookup(args: &LookupArgs) -> Result<i32> {
    let (registry, _) = load_registry(&args.manifest)?;
    let Some(model) = lookup_model(&registry, &args.value) else {
        eprintln!("no model registered for value '{}'", args.value);
        return Ok(1);
    };
    println!(
        "{}",
        serde_json::to_string_pretty(model.as_ref()).context("failed to render model")?
    );
    Ok(0)
}

/// Text match first, then the number the text parses to.
fn lookup_model(
    registry: &ModelChoiceRegistry<DeclaredModel>,
    raw: &str,
) -> Option<Arc<DeclaredModel>> {
    registry
        .get_model(raw)
        .or_else(|| {
            let number = match raw.parse::<i64>() {
                Ok(int) => Scalar::from(int),
                Err(_) => Scalar::from(raw.parse::<f64>().ok()?),
            };
            registry.get_model(number)
        })
        .cloned()
}
