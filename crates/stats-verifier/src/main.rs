use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tectonic_stats_verifier::bigquery::auth::CREDENTIALS_ENV;
use tectonic_stats_verifier::clients::LiveClients;
use tectonic_stats_verifier::config::{ConfigOverrides, load_config};
use tectonic_stats_verifier::suite::Suite;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Verifies that the stats emitter reports reached the cluster logs and BigQuery.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// BigQuery table to check, as bigquery://project.dataset.table.
    /// Leave empty to skip the BigQuery check.
    #[arg(long = "bigqueryspec")]
    bigquery_spec: Option<String>,

    /// How long each check may keep retrying, e.g. "1m" or "90s".
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Pause between attempts of the log check.
    #[arg(long, value_parser = humantime::parse_duration)]
    logs_interval: Option<Duration>,

    /// Pause between attempts of the BigQuery check.
    #[arg(long, value_parser = humantime::parse_duration)]
    bigquery_interval: Option<Duration>,

    /// Path to a YAML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kubeconfig to use instead of the in-cluster or default config.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Service account JSON for BigQuery.
    #[arg(long, env = CREDENTIALS_ENV)]
    credentials: Option<PathBuf>,
}

fn initialize_standard_tracing() {
    let default_directives = "tectonic_stats_verifier=info,kube=warn,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::eyre::Result<ExitCode> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");
    let args = Args::parse();

    initialize_standard_tracing();

    let overrides = ConfigOverrides {
        bigquery_spec: args.bigquery_spec,
        timeout: args.timeout,
        logs_interval: args.logs_interval,
        bigquery_interval: args.bigquery_interval,
        kubeconfig: args.kubeconfig.filter(|p| !p.as_os_str().is_empty()),
        credentials_path: args.credentials.filter(|p| !p.as_os_str().is_empty()),
    };
    let config = match load_config(args.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                name = "verifier.config.invalid",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "failed to load configuration"
            );
            return Ok(ExitCode::from(2));
        }
    };

    tracing::info!(
        name = "verifier.start",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        namespace = %config.namespace,
        bigquery_spec = %config.bigquery_spec,
        timeout = ?config.timeout,
        message = "starting stats verification"
    );

    let clients = LiveClients::new(
        config.kubeconfig.clone(),
        config.credentials_path.clone(),
        config.bigquery_endpoint.clone(),
    );
    let report = Suite::new(config, clients).run().await;

    for case in &report.cases {
        println!("--- {}: {}", case.name, case.outcome);
    }
    println!("{}", if report.success() { "PASS" } else { "FAIL" });

    Ok(ExitCode::from(report.exit_code() as u8))
}
