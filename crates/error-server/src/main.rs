use clap::Parser;
use std::path::PathBuf;
use tectonic_error_server::api::{openapi, start_webserver};
use tectonic_error_server::config::load_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default backend that renders error pages for an ingress controller.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to serve the default backend on.
    #[arg(long)]
    addr: Option<String>,

    /// Path to a YAML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the OpenAPI document as JSON and exit.
    #[arg(long)]
    print_openapi: bool,
}

fn initialize_standard_tracing() {
    let default_directives = "tectonic_error_server=info,tower_http=info,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    let args = Args::parse();

    if args.print_openapi {
        println!("{}", serde_json::to_string_pretty(&openapi())?);
        return Ok(());
    }

    initialize_standard_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.addr = addr;
        config.validate()?;
    }

    start_webserver(&config).await?;
    Ok(())
}
