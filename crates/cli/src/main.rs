use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{init_structured_logging, DocgenError, DocgenResult, FileSystemError, LoggingConfig};
use docgen::{DocstringCache, DocstringGenerator, FunctionMetadata, GeneratorConfig, Style};
use llm::ModelClient;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "docsmith")]
#[command(about = "Generate Python docstrings from function metadata")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate docstring bodies for functions described in a JSON file
    Generate {
        /// One metadata object or an array of them
        #[arg(long)]
        metadata: PathBuf,

        /// google, numpy, rest or none
        #[arg(long, default_value = "google")]
        style: Style,

        /// Ignore cached bodies and ask for fresh wording
        #[arg(long)]
        regenerate: bool,
    },
    /// Generate a module-level docstring for a source file
    Module {
        file: PathBuf,

        /// Leading lines shown to the model
        #[arg(long)]
        preview_lines: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_structured_logging(
        LoggingConfig::default()
            .verbose(cli.verbose)
            .json(cli.json_logs),
    )?;

    dotenv::dotenv().ok();
    let client = ModelClient::from_env()?;
    let mut config = GeneratorConfig::from_env()?;

    match cli.command {
        Commands::Generate {
            metadata,
            style,
            regenerate,
        } => {
            let functions = load_metadata(&metadata)?;
            let generator = build_generator(client, config);
            info!(count = functions.len(), style = %style, "Generating docstrings");

            let show_headers = functions.len() > 1;
            let mut bodies = Vec::with_capacity(functions.len());
            for meta in &functions {
                let body = generator.generate(meta, style, regenerate).await;
                if show_headers {
                    bodies.push(format!("# {}\n{}", meta.display_name(), body));
                } else {
                    bodies.push(body);
                }
            }
            println!("{}", bodies.join("\n\n"));
        }
        Commands::Module {
            file,
            preview_lines,
        } => {
            if let Some(lines) = preview_lines {
                config = config.with_module_preview_lines(lines);
            }
            let generator = build_generator(client, config);
            println!("{}", generator.generate_module(&file, "").await);
        }
    }

    Ok(())
}

fn build_generator(client: ModelClient, config: GeneratorConfig) -> DocstringGenerator {
    DocstringGenerator::with_cache(Arc::new(client), Arc::new(DocstringCache::new()), config)
}

fn load_metadata(path: &Path) -> DocgenResult<Vec<FunctionMetadata>> {
    let shown = path.display().to_string();
    let invalid = |reason: String| DocgenError::Metadata {
        path: shown.clone(),
        reason,
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| FileSystemError::from_io("read metadata", &shown, e))?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|e| invalid(format!("not valid JSON ({e})")))?;

    let functions = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<FunctionMetadata>, _>>(),
        Value::Object(_) => serde_json::from_value(value).map(|meta| vec![meta]),
        _ => return Err(invalid("expected a metadata object or an array of them".to_string())),
    };

    functions.map_err(|e| invalid(e.to_string()))
}
