use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};

use swagdoc::{
    export::{export_all, OutputFormat},
    DocumentConfig,
};

mod demo;

/// Generate Swagger 2.0 / OpenAPI 3.0.3 documents from endpoint descriptions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the built-in pet store endpoints
    Demo {
        /// Document version (2.0, 3.0.3)
        #[arg(long = "oas", default_value = "2.0")]
        openapi_version: String,

        /// Output directory for generated files
        #[arg(short, long, default_value = "./docs")]
        output: String,

        /// Output types to generate (json,yaml)
        #[arg(long = "ot", default_value = "json,yaml")]
        output_types: String,

        /// JSON or YAML file with document-level settings
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = Env::default().filter_or("RUST_LOG", if cli.verbose { "debug" } else { "info" });
    env_logger::init_from_env(env);

    debug!("Starting swagdoc...");

    match &cli.command {
        Commands::Demo {
            openapi_version,
            output,
            output_types,
            config,
        } => {
            let formats = output_types
                .split(',')
                .map(|s| s.parse::<OutputFormat>())
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to parse output types")?;

            let config = match config {
                Some(path) => DocumentConfig::from_file(path)
                    .with_context(|| format!("Failed to load config from {}", path))?,
                None => demo::config(),
            };
            debug!("Document config: {:?}", config);
            debug!("Output directory: {}", output);

            let written = match openapi_version.as_str() {
                "2.0" | "2" => {
                    let swagger = demo::swagger(config).context("Failed to build Swagger 2.0 generator")?;
                    export_all(&swagger, output, &formats)
                }
                "3.0.3" | "3.0" | "3" => {
                    let openapi = demo::openapi(config).context("Failed to build OpenAPI 3.0.3 generator")?;
                    export_all(&openapi, output, &formats)
                }
                other => bail!("Unsupported document version: {} (expected 2.0 or 3.0.3)", other),
            }
            .with_context(|| format!("Failed to write documents to {}", output))?;

            for path in &written {
                info!("Wrote {}", path.display());
            }
            info!("Documentation generated successfully");
        }
    }

    Ok(())
}
