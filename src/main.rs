use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vpn_hop::config::ConfigError;
use vpn_hop::hop::{self, Decision, RandomPicker, Snapshot};
use vpn_hop::nordvpn::NordVpnCli;
use vpn_hop::probe::HttpProbe;
use vpn_hop::{Config, Hopper};

#[derive(Parser)]
#[command(name = "vpn-hop")]
#[command(about = "Rotate the VPN exit location on a fixed interval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ./vpn-hop.toml, then ~/.vpn-hop/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimum session age in seconds before rotating
    #[arg(long, global = true)]
    min_uptime: Option<u64>,

    /// Seconds between cycles
    #[arg(long, global = true)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check and rotate forever
    Run,
    /// Run a single cycle and exit
    Once,
    /// Show what the next cycle would see
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let overrides = Overrides {
        config: cli.config,
        min_uptime: cli.min_uptime,
        interval: cli.interval,
    };

    if let Err(e) = execute(cli.command, overrides).await {
        error!("Stopping: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn execute(command: Commands, overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init => {
            let path = overrides
                .config
                .unwrap_or_else(|| PathBuf::from("vpn-hop.toml"));
            if path.exists() {
                println!("Config already exists: {}", path.display());
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("Created default config: {}", path.display());
        }
        Commands::Run => {
            let config = overrides.load()?;
            let control = NordVpnCli::new(&config.vpn);
            let probe = HttpProbe::new(&config.probe)?;
            let mut hopper = Hopper::new(control, probe, config.rotation, RandomPicker);
            hopper.run().await?;
        }
        Commands::Once => {
            let config = overrides.load()?;
            run_once(&config).await?;
        }
        Commands::Status { json } => {
            let config = overrides.load()?;
            let control = NordVpnCli::new(&config.vpn);
            let probe = HttpProbe::new(&config.probe)?;
            let snapshot = hop::collect(&control, &probe).await?;
            print_status(&snapshot, json)?;
        }
    }

    Ok(())
}

/// Config location and command-line overrides of the file's rotation values
struct Overrides {
    config: Option<PathBuf>,
    min_uptime: Option<u64>,
    interval: Option<u64>,
}

impl Overrides {
    fn load(&self) -> Result<Config, ConfigError> {
        let mut config = Config::discover(self.config.as_deref())?;
        if let Some(secs) = self.min_uptime {
            config.rotation.min_uptime_secs = secs;
        }
        if let Some(secs) = self.interval {
            config.rotation.hop_interval_secs = secs;
        }
        Ok(config)
    }
}

fn print_status(snapshot: &Snapshot, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let state = &snapshot.state;
    println!("VPN Status: {}", state.connectivity);
    if state.is_connected() {
        println!("  Country: {}", state.country.as_deref().unwrap_or("-"));
        println!("  City: {}", state.city.as_deref().unwrap_or("-"));
        println!("  Uptime: {:?}", state.uptime);
    }
    let internet = if snapshot.reachable {
        "reachable"
    } else {
        "unreachable"
    };
    println!("  Internet: {}", internet);
    println!("  Locations: {}", snapshot.locations.len());
    Ok(())
}

async fn run_once(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    config.rotation.validate()?;
    let control = NordVpnCli::new(&config.vpn);
    let probe = HttpProbe::new(&config.probe)?;
    let decision = hop::run_cycle(&control, &probe, &config.rotation, &mut RandomPicker).await?;
    if let Decision::Rotate { target } = decision {
        info!("Rotated to {}", target);
    }
    Ok(())
}
