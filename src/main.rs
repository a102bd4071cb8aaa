use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use district_atlas::{
    export,
    web::{self, WebServerConfig},
    Atlas, AtlasConfig, ResourceAttribute,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "District map with survivors and monsters")]
struct Cli {
    /// Path to an atlas YAML config (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the interactive map with its attribute selector
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Render one attribute to a standalone HTML file
    Render {
        /// Resource attribute to color districts by
        #[arg(long, default_value_t = ResourceAttribute::default())]
        attribute: ResourceAttribute,

        /// Output HTML file
        #[arg(long, default_value = "district_map.html")]
        output: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AtlasConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AtlasConfig::default(),
    };
    init_logging(&config.logging.level);

    let server = config.server.clone();
    let atlas = Atlas::from_config(config).context("Failed to build HTTP client")?;

    match cli.command {
        Command::Serve { host, port } => {
            web::run(
                atlas,
                WebServerConfig {
                    host: host.unwrap_or(server.host),
                    port: port.unwrap_or(server.port),
                },
            )
            .await
        }
        Command::Render { attribute, output } => {
            let rendered = atlas
                .render(attribute)
                .await
                .context("No district data available")?;
            for warning in &rendered.document.warnings {
                eprintln!("warning: {}: {}", warning.source, warning.message);
            }
            export::write_standalone(&rendered.document, &output)?;
            println!(
                "Rendered {} districts for '{}' to {}",
                rendered.document.districts.features.len(),
                attribute,
                output.display()
            );
            Ok(())
        }
    }
}
