mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use calltree_core::PanelConfig;
use calltree_core::model::{FlamegraphDetails, Snapshot};
use calltree_protocol::ValueUnit;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Explore a call-tree profile as an interactive flamegraph.
///
/// Click a frame to zoom to it, click empty space to zoom out, press `/` to
/// highlight frames by name.
#[derive(Parser, Debug)]
#[command(name = "calltree", version)]
struct Cli {
    /// Folded stacks (`a;b;c 42`) or a JSON list of callsite records
    profile: PathBuf,

    /// Panel configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Quiet period before the focus query is applied
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Fold callsites narrower than this many columns into `[merged]`
    #[arg(long, value_name = "COLUMNS")]
    merge_min_pixels: Option<f64>,

    /// What the profile sizes measure (samples, bytes, ns, us, ms, weight)
    #[arg(short, long, default_value = "samples")]
    unit: ValueUnit,

    /// Profile name shown in the title, e.g. `p1234_t1234`
    #[arg(long)]
    name: Option<String>,

    /// Write logs here (filtered by `RUST_LOG`); logging is off otherwise
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<PanelConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PanelConfig::from_toml_str(&text)?
        }
        None => PanelConfig::default(),
    };
    if let Some(ms) = cli.debounce_ms {
        config.debounce_ms = ms;
    }
    if let Some(pixels) = cli.merge_min_pixels {
        config.merge_min_pixels = pixels;
    }
    // Terminal cells are the pixel unit: one row per depth, one header row.
    config.node_height = 1.0;
    config.header_height = 1.0;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = load_config(&cli)?;
    let data = std::fs::read(&cli.profile)
        .with_context(|| format!("reading profile {}", cli.profile.display()))?;
    let records = calltree_core::parsers::parse_auto(&data)?;
    info!(callsites = records.len(), path = %cli.profile.display(), "profile loaded");

    let name = cli.name.clone().unwrap_or_else(|| {
        cli.profile
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let details = FlamegraphDetails::new(name, Snapshot::new(records)).with_unit(cli.unit);

    renderer::run(config, details)
}
