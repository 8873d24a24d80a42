use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use minibackend::{Config, Store, server};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minibackend")]
#[command(about = "Contacts and tasks backend over whole-file JSON collections")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, env = "MINIBACKEND_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding contacts.json, tasks.json and categories.json
    #[arg(short, long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Bind address for the HTTP server
    #[arg(short, long, env = "HTTP_BIND")]
    bind: Option<SocketAddr>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,

    /// Create the data directory and seed empty collection files
    Init,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.bind, cli.data_dir);

    match cli.command {
        Commands::Serve => server::serve(config).await?,
        Commands::Init => {
            let store = Store::open(&config.data_dir);
            let created = store
                .init()
                .with_context(|| format!("Failed to initialize {}", config.data_dir.display()))?;

            if created.is_empty() {
                println!("{} all collection files already exist", "ok:".green());
            }
            for path in created {
                println!("{} {}", "created".green(), path.display());
            }
        }
    }

    Ok(())
}
