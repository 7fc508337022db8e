//! Component Forge CLI
//!
//! Usage:
//!   component-forge [OPTIONS] <URI>
//!
//! Options:
//!   -r, --root <DIR>        Base directory holding component directories
//!   -d, --data <JSON>       Custom data for the root component
//!       --data-file <FILE>  Read custom data from a JSON file
//!   -c, --config <FILE>     Engine configuration (TOML format)
//!       --no-cache          Disable the load and render caches
//!       --check             Only parse the component's template and report errors
//!   -o, --output <FILE>     Write the document to a file instead of stdout
//!   -h, --help              Print help

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use component_forge::{
    markup, ComponentSource, DataMap, FileSystemSource, RenderConfig, RenderError, Renderer,
    SourceError,
};

#[derive(Parser)]
#[command(name = "component-forge")]
#[command(about = "Render a tree of HTML components into a single document")]
struct Cli {
    /// Component URI, relative to the root directory
    uri: String,

    /// Base directory holding component directories
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Custom data for the root component, as a JSON object
    #[arg(short, long, conflicts_with = "data_file")]
    data: Option<String>,

    /// Read custom data from a JSON file
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the load and render caches
    #[arg(long)]
    no_cache: bool,

    /// Only parse the component's template and report markup errors
    #[arg(long)]
    check: bool,

    /// Output file (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_file(path)
            .map_err(|e| format!("Error loading config '{}': {}", path.display(), e))?,
        None => RenderConfig::default(),
    };
    if cli.no_cache {
        config = config.with_load_caching(false).with_render_cache(false);
    }

    let source = FileSystemSource::new(&cli.root);

    if cli.check {
        return check(&source, &cli.uri, &config).await;
    }

    let data = read_data(&cli)?;
    let renderer = Renderer::new(Arc::new(source)).with_config(config);
    let html = renderer
        .render(&cli.uri, data)
        .await
        .map_err(|e| describe(&e))?;

    match &cli.output {
        Some(path) => fs::write(path, html)
            .map_err(|e| format!("Error writing '{}': {}", path.display(), e)),
        None => {
            println!("{}", html);
            Ok(())
        }
    }
}

/// Parse the component's template, printing a source-annotated report on
/// failure
async fn check(source: &FileSystemSource, uri: &str, config: &RenderConfig) -> Result<(), String> {
    let definition = source
        .load(uri, &config.load_options)
        .await
        .map_err(|e| format!("Error: {}", e))?;
    match markup::parse(&definition.template) {
        Ok(_) => {
            eprintln!("{}: ok", uri);
            Ok(())
        }
        Err(e) => Err(e.format(&definition.template, &format!("{}/template.html", uri))),
    }
}

fn read_data(cli: &Cli) -> Result<Option<DataMap>, String> {
    let text = match (&cli.data, &cli.data_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| format!("Error reading data file '{}': {}", path.display(), e))?,
        (None, None) => return Ok(None),
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err("Error: custom data must be a JSON object".to_string()),
        Err(e) => Err(format!("Error parsing custom data: {}", e)),
    }
}

fn describe(error: &RenderError) -> String {
    match error {
        RenderError::Source(SourceError::NotFound { uri }) => {
            format!("Error: component '{}' not found", uri)
        }
        other => format!("Error: {}", other),
    }
}
