use anyhow::{Context, Result};
use centinela::config::Config;
use centinela::core::{Endpoint, Intent, Timeouts};
use centinela::health::{probe_monitor, HealthStatus};
use centinela::sentinel::{MonitorClient, SentinelResolver, StaticTopology, Topology};
use centinela::store::Store;
use centinela::utils::format_duration;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "centinela")]
#[command(about = "Fault-tolerant Redis Sentinel access layer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/centinela.toml")]
    config: PathBuf,
    /// Talk to this host:port directly instead of asking the monitors
    #[arg(long)]
    direct: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an example configuration file
    Config {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the address the next operation would be routed to
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        /// Resolve a readable replica instead of the master
        #[arg(long)]
        read: bool,
    },
    /// PING every configured monitor and report its health
    Ping {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// GET a key
    Get {
        #[command(flatten)]
        target: Target,
        key: String,
    },
    /// SET a key, optionally with an expiry in seconds
    Set {
        #[command(flatten)]
        target: Target,
        key: String,
        value: String,
        #[arg(long)]
        ex: Option<u64>,
    },
    /// DEL a key
    Del {
        #[command(flatten)]
        target: Target,
        key: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { output } => generate_config(output),
        Commands::Validate { config } => validate_config(config),
        Commands::Resolve { config, read } => resolve(config, read).await,
        Commands::Ping { config } => ping_monitors(config).await,
        Commands::Get { target, key } => {
            let store = open_store(&target)?;
            match store.get(&key).await? {
                Some(value) => println!("{}", value),
                None => println!("(nil)"),
            }
            Ok(())
        }
        Commands::Set {
            target,
            key,
            value,
            ex,
        } => {
            let store = open_store(&target)?;
            match ex {
                Some(seconds) => store.set_ex(&key, &value, Duration::from_secs(seconds)).await?,
                None => store.set(&key, &value).await?,
            }
            println!("OK");
            Ok(())
        }
        Commands::Del { target, key } => {
            let store = open_store(&target)?;
            println!("{}", store.del(&key).await?);
            Ok(())
        }
        Commands::Version => {
            show_version();
            Ok(())
        }
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let config = Config::load_from_file(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    init_logging(&config);
    info!("Configuration loaded from: {:?}", path);
    Ok(config)
}

fn open_store(target: &Target) -> Result<Store<Arc<dyn Topology>>> {
    let config = load_config(&target.config)?;
    let sentinel = &config.sentinel;

    let topology: Arc<dyn Topology> = match &target.direct {
        Some(addr) => {
            let endpoint: Endpoint = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid --direct address: {}", e))?;
            Arc::new(StaticTopology::new(endpoint))
        }
        None => Arc::new(SentinelResolver::from_config(sentinel)?),
    };

    Ok(Store::with_config(topology, sentinel))
}

async fn resolve(config_path: PathBuf, read: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let resolver = SentinelResolver::from_config(&config.sentinel)?;
    let intent = if read { Intent::Read } else { Intent::Write };

    let started = Instant::now();
    let endpoint = resolver.resolve(intent).await?;
    println!(
        "{} {} -> {} (resolved in {})",
        config.sentinel.master_name,
        intent,
        endpoint,
        format_duration(started.elapsed())
    );
    Ok(())
}

async fn ping_monitors(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let sentinel = &config.sentinel;
    let timeouts = Timeouts {
        connect: sentinel.connect_timeout(),
        read: sentinel.read_timeout(),
    };

    let mut healthy = 0;
    let endpoints = sentinel.endpoints()?;
    for endpoint in &endpoints {
        let status = match MonitorClient::open(endpoint, timeouts, sentinel.sentinel_password.as_deref()).await {
            Ok(mut client) => {
                let status = probe_monitor(&mut client).await;
                client.close().await;
                status
            }
            Err(e) => HealthStatus::Unhealthy {
                reason: e.to_string(),
            },
        };
        if status.is_healthy() {
            healthy += 1;
        }
        println!("  {}: {}", endpoint, status);
    }

    println!("{}/{} monitors healthy", healthy, endpoints.len());
    if healthy == 0 {
        anyhow::bail!("no monitor responded");
    }
    Ok(())
}

fn generate_config(output: PathBuf) -> Result<()> {
    println!("Generating configuration file: {:?}", output);

    Config::create_example_config(&output).context("Failed to generate config")?;

    println!("Configuration file generated successfully!");
    println!("Edit the file to match your environment and run:");
    println!("  centinela resolve --config {:?}", output);

    Ok(())
}

fn validate_config(config_path: PathBuf) -> Result<()> {
    println!("Validating configuration file: {:?}", config_path);

    match Config::load_from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration file is valid");
            println!("  Master name: {}", config.sentinel.master_name);
            println!("  Sentinel nodes: {} instances", config.sentinel.nodes.len());
            for (i, node) in config.sentinel.nodes.iter().enumerate() {
                println!("    {}: {}", i + 1, node);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration file validation failed:");
            eprintln!("  {}", e);
            Err(e.into())
        }
    }
}

fn show_version() {
    println!("centinela v{}", env!("CARGO_PKG_VERSION"));
    println!("Fault-tolerant Redis Sentinel access layer");
    println!();
    println!("Features:");
    println!("  • Per-call master/replica resolution through the sentinel quorum");
    println!("  • Monitor-aware replica selection for reads");
    println!("  • Token-based distributed lock with atomic release");
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_ok() {
        info!("Logging initialized at level: {}", config.logging.level);
    }
}
