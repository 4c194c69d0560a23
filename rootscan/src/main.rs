use anyhow::{Context, Result};
use clap::Parser;
use rootscan_core::{BlockStore, scan};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod output;
use output::{OutputWriter, ScanOutput, render_table};

/// Environment variable naming the store root.
const ROOT_ENV: &str = "CASQ_ROOT";

/// Store directory under the home directory.
const DEFAULT_DIR: &str = ".casq";

/// Rootscan - list the apparent roots of a block store
#[derive(Parser)]
#[command(name = "rootscan")]
#[command(about = "List stored objects that nothing else links to", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to CASQ_ROOT env var or ~/.casq)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output JSON instead of progress lines and a table
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let output = OutputWriter::new(cli.json);
    if let Err(e) = run(cli.root, &output) {
        output.write_error(&e, 1);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(root: Option<PathBuf>, output: &OutputWriter) -> Result<()> {
    let root = store_root(root, std::env::var_os(ROOT_ENV), dirs::home_dir())?;

    let store = BlockStore::open(&root)
        .with_context(|| format!("Failed to open store at {}", root.display()))?;

    let report = scan(&store, |stage| output.progress(stage))
        .with_context(|| format!("Failed to scan store at {}", root.display()))?;

    let data = ScanOutput::from(report);
    output.write(&data, || render_table(&data.objects))
}

/// Pick the store root: CLI arg > CASQ_ROOT env var > ~/.casq.
fn store_root(
    flag: Option<PathBuf>,
    env: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    if let Some(env) = env.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(env));
    }
    match home {
        Some(home) => Ok(home.join(DEFAULT_DIR)),
        None => anyhow::bail!(
            "Could not determine store location: pass --root or set {}",
            ROOT_ENV
        ),
    }
}
