use crate::cli::EncodeCli;
use crate::container::ContainerWriter;
use crate::differ::{is_refresh_frame, FrameDiffer};
use crate::render::{sobel, BrailleRenderer};
use crate::subtitles::{caption_for_frame, parse_subtitles};
use crate::utils::percent;
use crate::Result;
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Outcome of one encoder run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Frames appended to the container in this run
    pub frames_written: u64,
    /// Frames found in the input directory
    pub frames_total: u64,
}

/// Encode a directory of images into the stream container.
///
/// Frame index is the position in sorted filename order. Indices below
/// `--resume-from` are skipped (the container is opened for append and
/// the header and audio block are left untouched); encoding stops after
/// `--until-frame`. Any per-frame I/O failure aborts the run, leaving
/// the flushed prefix usable for a later resume.
pub fn encode(cli: &EncodeCli) -> Result<EncodeSummary> {
    let images = list_frames(cli)?;
    let total = images.len() as u64;
    let prefix = cli.progress_prefix();
    info!("{}Encoding {} frames from {}", prefix, total, cli.input.display());

    let resume = cli.resume_from > 0;
    let mut writer = ContainerWriter::create(&cli.output, resume)?;
    if !resume {
        writer.write_header(total, cli.fps)?;
        if let Some(ref audio_path) = cli.audio {
            info!("{}Embedding audio from {}", prefix, audio_path.display());
            let bytes = std::fs::read(audio_path)?;
            writer.write_audio(&bytes)?;
        }
    }

    let subs = match cli.subtitles {
        Some(ref path) => parse_subtitles(path, cli.fps)?,
        None => Vec::new(),
    };

    let renderer = BrailleRenderer::new(cli.render_options());
    let mut differ = FrameDiffer::new();
    let start = Instant::now();

    for (num, path) in images.iter().enumerate() {
        let num = num as u64;
        if num < cli.resume_from {
            continue;
        }
        if cli.until_frame.is_some_and(|until| num > until) {
            debug!("{}Stopping after frame limit", prefix);
            break;
        }

        let mut image = image::open(path)?;
        if cli.sobel {
            image = sobel(&image);
        }

        let frame = renderer.render(&image);
        let caption = caption_for_frame(&subs, num);
        let force_refresh = cli.no_compress || is_refresh_frame(num, cli.fps);
        let instructions = differ.encode_frame(&frame.rows, force_refresh);
        writer.write_frame(&instructions, caption)?;

        let taken = start.elapsed().as_secs_f64();
        let speed = if taken > 0.0 { num as f64 / taken } else { 0.0 };
        info!(
            "{}Done with frame #{} ({:.2}%) {:.2}s taken, {:.2} fps, {:.2}% speed. {}",
            prefix,
            num,
            percent(num as f64, total as f64),
            taken,
            speed,
            percent(speed, f64::from(cli.fps)),
            frame.header
        );
    }

    let frames_written = writer.frames_written();
    writer.finish()?;
    info!("{}Wrote {} frames to {}", prefix, frames_written, cli.output.display());

    Ok(EncodeSummary {
        frames_written,
        frames_total: total,
    })
}

/// Input frames in sorted filename order
fn list_frames(cli: &EncodeCli) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(&cli.input)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use image::{Rgba, RgbaImage};
    use std::path::Path;
    use tempfile::tempdir;

    fn write_frame_image(dir: &Path, name: &str, value: u8) {
        let buf = RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255]));
        buf.save(dir.join(name)).unwrap();
    }

    fn encode_cli(input: &Path, output: &Path, extra: &[&str]) -> EncodeCli {
        let mut args = vec![
            "braille-enc".to_string(),
            "--input".to_string(),
            input.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
            "--max-x".to_string(),
            "4".to_string(),
            "--disable-padding".to_string(),
            "--disable-processing".to_string(),
            "--fps".to_string(),
            "10".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        EncodeCli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_encode_writes_all_frames() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_frame_image(input.path(), "000.png", 0);
        write_frame_image(input.path(), "001.png", 255);
        let output = out.path().join("out.bst");

        let summary = encode(&encode_cli(input.path(), &output, &[])).unwrap();
        assert_eq!(summary.frames_written, 2);
        assert_eq!(summary.frames_total, 2);

        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.starts_with("#meta frames=2;fps=10\n"));
        assert_eq!(contents.matches("#next").count(), 2);
    }

    #[test]
    fn test_identical_frames_compress_to_empty_rows() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_frame_image(input.path(), "000.png", 255);
        write_frame_image(input.path(), "001.png", 255);
        let output = out.path().join("out.bst");

        encode(&encode_cli(input.path(), &output, &[])).unwrap();

        let contents = std::fs::read_to_string(&output).unwrap();
        let frames: Vec<&str> = contents.splitn(2, "#next\n").collect();
        // Frame 1 repeats frame 0 exactly: rows collapse to blank lines
        assert_eq!(frames[1], "\n\n#next\n");
    }

    #[test]
    fn test_no_compress_repeats_literals() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_frame_image(input.path(), "000.png", 255);
        write_frame_image(input.path(), "001.png", 255);
        let output = out.path().join("out.bst");

        encode(&encode_cli(input.path(), &output, &["--no-compress"])).unwrap();

        let contents = std::fs::read_to_string(&output).unwrap();
        // Both frames carry the full row
        assert_eq!(contents.matches('\u{28FF}').count(), 4);
    }

    #[test]
    fn test_until_frame_stops_early() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        for i in 0..5 {
            write_frame_image(input.path(), &format!("{:03}.png", i), 255);
        }
        let output = out.path().join("out.bst");

        let summary =
            encode(&encode_cli(input.path(), &output, &["--until-frame", "2"])).unwrap();
        assert_eq!(summary.frames_written, 3);
    }

    #[test]
    fn test_resume_appends_without_header() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        for i in 0..4 {
            write_frame_image(input.path(), &format!("{:03}.png", i), if i < 2 { 0 } else { 255 });
        }
        let output = out.path().join("out.bst");

        encode(&encode_cli(input.path(), &output, &["--until-frame", "1"])).unwrap();
        let original = std::fs::read(&output).unwrap();

        let summary =
            encode(&encode_cli(input.path(), &output, &["--resume-from", "2"])).unwrap();
        assert_eq!(summary.frames_written, 2);

        let appended = std::fs::read(&output).unwrap();
        assert_eq!(&appended[..original.len()], &original[..]);
        // Exactly one header line in the whole file
        let text = String::from_utf8_lossy(&appended);
        assert_eq!(text.matches("#meta").count(), 1);
    }

    #[test]
    fn test_caption_written_from_subtitles() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        for i in 0..3 {
            write_frame_image(input.path(), &format!("{:03}.png", i), 0);
        }
        let subs = out.path().join("subs.srt");
        std::fs::write(&subs, "0:00:00.0 --> 0:00:01.0\nhello\n").unwrap();
        let output = out.path().join("out.bst");

        let cli = encode_cli(
            input.path(),
            &output,
            &["--subtitles", &subs.display().to_string()],
        );
        encode(&cli).unwrap();

        // Cue covers frames 0..10 exclusive: frames 1 and 2 carry it
        let contents = std::fs::read_to_string(&output).unwrap();
        assert_eq!(contents.matches("hello").count(), 2);
    }

    #[test]
    fn test_audio_embedded_before_frames() {
        let input = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_frame_image(input.path(), "000.png", 0);
        let audio = out.path().join("track.pcm");
        std::fs::write(&audio, [1u8, 2, 3, 4, 5]).unwrap();
        let output = out.path().join("out.bst");

        let cli = encode_cli(input.path(), &output, &["--audio", &audio.display().to_string()]);
        encode(&cli).unwrap();

        let contents = std::fs::read(&output).unwrap();
        let text = String::from_utf8_lossy(&contents);
        let audio_pos = text.find("#audio").unwrap();
        let next_pos = text.find("#next").unwrap();
        assert!(audio_pos < next_pos);
    }
}
