use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use huddle::core::config::{self, CliOverrides};
use huddle::host;
use huddle::provider::{EchoAdapter, ScriptProvider};
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "huddle", about = "Live session view-model engine")]
struct Args {
    /// JSON-lines script of host events to replay
    script: PathBuf,

    /// Send read receipts (overrides config)
    #[arg(long)]
    read_receipts: Option<bool>,

    /// Minimum time a compliance banner stays up, in milliseconds
    #[arg(long)]
    banner_delay_ms: Option<u64>,

    /// Log file path
    #[arg(long)]
    log_file: Option<String>,

    /// Older pages the echo adapter pretends to have
    #[arg(long, default_value_t = 1)]
    history_pages: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {e}, using defaults");
        config::HuddleConfig::default()
    });
    let cli = CliOverrides {
        read_receipts: args.read_receipts,
        banner_delay_ms: args.banner_delay_ms,
        log_file: args.log_file,
    };
    let resolved = config::resolve(&file_config, &cli);

    // Initialize file logger
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("Huddle starting up with script {}", args.script.display());
    log::debug!("Resolved config: {:?}", resolved);

    let script = ScriptProvider::from_path(&args.script)?;
    let adapter = Arc::new(EchoAdapter::new(args.history_pages));
    host::run(&resolved, script, adapter).await?;
    Ok(())
}
