use anyhow::Result;
use braille_cast::cli::EncodeCli;
use braille_cast::encoder;
use clap::Parser;
use log::{error, info};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse and validate command line arguments
    let cli = EncodeCli::parse();
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    info!("Starting braille-enc v{}", env!("CARGO_PKG_VERSION"));

    let summary = encoder::encode(&cli)?;
    info!(
        "Encoded {} of {} frames into {}",
        summary.frames_written,
        summary.frames_total,
        cli.output.display()
    );

    Ok(())
}
