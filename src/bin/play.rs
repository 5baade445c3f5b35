use anyhow::Result;
use braille_cast::audio::{AudioSink, NullSink, ProcessSink};
use braille_cast::cli::PlayCli;
use braille_cast::demuxer::Demuxer;
use braille_cast::player::Player;
use clap::Parser;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse and validate command line arguments
    let cli = PlayCli::parse();
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    info!("Starting braille-play v{}", env!("CARGO_PKG_VERSION"));

    // Open the stream; the demuxer only needs sequential reads, so
    // a file and standard input look the same from here on
    let reader: Box<dyn BufRead> = if cli.reads_stdin() {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(&cli.input)?))
    };
    let mut demuxer = Demuxer::open(reader)?;

    if cli.info {
        println!("{}", serde_json::to_string_pretty(demuxer.meta())?);
        return Ok(());
    }

    let meta = demuxer.meta().clone();
    let fps = cli.fps.unwrap_or_else(|| f64::from(meta.fps));
    info!(
        "Playing {} frames at {:.2} fps ({:.1}s)",
        meta.frames,
        fps,
        meta.duration_secs()
    );

    // Hand embedded audio to the external player before the first frame
    let audio = demuxer.take_audio();
    let mut sink: Box<dyn AudioSink> = match audio {
        Some(_) if !cli.no_audio => match ProcessSink::vlc() {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                warn!("Audio player unavailable, continuing silent: {}", e);
                Box::new(NullSink)
            }
        },
        _ => Box::new(NullSink),
    };
    if let Some(bytes) = audio {
        sink.feed(&bytes)?;
    }

    let mut player = Player::new(std::io::stdout(), fps, cli.skip);
    let state = player.run(demuxer.into_frames(), &meta).await?;

    info!(
        "Playback {:?} after {} frames",
        state,
        player.stats().frames()
    );
    Ok(())
}
