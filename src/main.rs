use std::fs::File;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use parley::client::EchoTransport;
use parley::config;
use parley::tui;

#[derive(Parser)]
#[command(name = "parley", about = "Terminal chat interface")]
struct Args {
    /// Model to use for this session (overrides the config file)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // File logger - writes to parley.log in the current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("parley.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let loaded = match config::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("config error: {e}");
            return Ok(());
        }
    };
    let resolved = config::resolve(loaded, args.model);
    log::info!("parley starting with model {}", resolved.default_model);

    tui::run(resolved, Arc::new(EchoTransport))
}
