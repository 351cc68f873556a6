use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ccgateway::config::Overrides;
use ccgateway::gateway::load_plugins;
use ccgateway::plugins::Catalog;
use ccgateway::{Config, Gateway};

/// ccgateway - verb-routed verification gateway
#[derive(Parser)]
#[command(name = "ccgateway", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ./gateway.toml, then the user config dir)
    #[arg(short, long, env = "CCGATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CCGATEWAY_BIND_IP")]
    bind_ip: Option<String>,

    /// Port to bind
    #[arg(long, env = "CCGATEWAY_PORT")]
    port: Option<u16>,

    /// Plugin folder (searched for upwards from the working directory if unset)
    #[arg(long, env = "CCGATEWAY_PLUGIN_DIR")]
    plugin_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the registered verbs and load diagnostics, then exit
    Verbs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,ccgateway=info",
        1 => "info,ccgateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let overrides = Overrides {
        bind_ip: cli.bind_ip,
        port: cli.port,
        plugin_dir: cli.plugin_dir,
    };

    let config = Config::load(cli.config.as_deref(), &cwd, overrides)?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(Command::Verbs) = cli.command {
        return print_verbs(&config, &cwd);
    }

    tracing::info!(addr = %config.bind_addr(), "starting gateway");

    let gateway = Gateway::boot(&config, &cwd).await?;
    tracing::info!(addr = %gateway.local_addr(), "gateway ready");

    gateway.run().await?;

    Ok(())
}

/// Print the registration table the gateway would serve with
fn print_verbs(config: &Config, cwd: &std::path::Path) -> anyhow::Result<()> {
    let loaded = load_plugins(config, cwd, &Catalog::builtin())?;

    println!("Plugin folder: {}", loaded.dir.display());
    for msg in &loaded.diagnostics {
        println!("  {msg}");
    }
    println!("---");
    for verb in loaded.registry.verbs() {
        let configured = if config.sections.get(verb).is_empty() {
            ""
        } else {
            " (configured)"
        };
        println!("{verb}{configured}");
    }

    Ok(())
}
