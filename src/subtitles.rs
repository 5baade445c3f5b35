use crate::{BrailleCastError, Result};
use log::{debug, info};
use std::path::Path;

/// One subtitle cue mapped onto the frame index axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    pub text: String,
    pub start_frame: u64,
    pub end_frame: u64,
}

/// Parse a subtitle file into frame-indexed cues.
///
/// The format is the SRT subset the encoder needs: a line containing
/// `-->` opens a cue with two timestamps; following text lines
/// accumulate into the cue. Cue numbers and blank lines are skipped.
pub fn parse_subtitles(path: &Path, fps: u32) -> Result<Vec<Subtitle>> {
    let text = std::fs::read_to_string(path)?;
    let subs = parse_subtitle_text(&text, fps)?;
    info!("Parsed {} subtitle cues from {}", subs.len(), path.display());
    Ok(subs)
}

/// Parse subtitle cues from already-loaded text
pub fn parse_subtitle_text(text: &str, fps: u32) -> Result<Vec<Subtitle>> {
    let mut subs: Vec<Subtitle> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        if let Some((start, end)) = line.split_once("-->") {
            let start_secs = parse_timestamp(start.trim())?;
            let end_secs = parse_timestamp(end.trim())?;
            subs.push(Subtitle {
                text: String::new(),
                start_frame: (start_secs * f64::from(fps)).floor() as u64,
                end_frame: (end_secs * f64::from(fps)).ceil() as u64,
            });
            debug!("Cue {}s -> {}s", start_secs, end_secs);
        } else if let Some(current) = subs.last_mut() {
            current.text.push_str(line);
        }
    }

    Ok(subs)
}

/// Caption for one frame: the cue whose range strictly contains the
/// index (`start < frame < end`), or the empty string. Boundary frames
/// deliberately match nothing.
pub fn caption_for_frame(subs: &[Subtitle], frame: u64) -> &str {
    subs.iter()
        .find(|s| s.start_frame < frame && frame < s.end_frame)
        .map_or("", |s| s.text.as_str())
}

/// Parse an `H:MM:SS.mmm` timestamp into seconds. SRT's comma decimal
/// separator is accepted too.
fn parse_timestamp(text: &str) -> Result<f64> {
    let mut parts = text.split(':');
    let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => {
            return Err(BrailleCastError::Format(format!(
                "bad subtitle timestamp {:?}",
                text
            )))
        }
    };

    let hours: u64 = hours
        .parse()
        .map_err(|_| BrailleCastError::Format(format!("bad hours in {:?}", text)))?;
    let minutes: u64 = minutes
        .parse()
        .map_err(|_| BrailleCastError::Format(format!("bad minutes in {:?}", text)))?;
    let seconds: f64 = seconds
        .replace(',', ".")
        .parse()
        .map_err(|_| BrailleCastError::Format(format!("bad seconds in {:?}", text)))?;

    Ok((hours * 3600 + minutes * 60) as f64 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("0:00:01.5").unwrap(), 1.5);
        assert_eq!(parse_timestamp("0:01:00.0").unwrap(), 60.0);
        assert_eq!(parse_timestamp("1:00:00.0").unwrap(), 3600.0);
        assert_eq!(parse_timestamp("00:00:02,500").unwrap(), 2.5);
        assert!(parse_timestamp("12.5").is_err());
        assert!(parse_timestamp("a:b:c").is_err());
    }

    #[test]
    fn test_parse_cues() {
        let text = "1\n00:00:01.0 --> 00:00:02.0\nhello\nworld\n\n2\n00:00:03.0 --> 00:00:04.0\nbye\n";
        let subs = parse_subtitle_text(text, 10).unwrap();

        assert_eq!(
            subs,
            vec![
                Subtitle {
                    text: "helloworld".to_string(),
                    start_frame: 10,
                    end_frame: 20,
                },
                Subtitle {
                    text: "bye".to_string(),
                    start_frame: 30,
                    end_frame: 40,
                },
            ]
        );
    }

    #[test]
    fn test_fractional_cue_bounds_widen() {
        // floor on start, ceil on end
        let text = "00:00:01.06 --> 00:00:01.94\nx\n";
        let subs = parse_subtitle_text(text, 10).unwrap();
        assert_eq!(subs[0].start_frame, 10);
        assert_eq!(subs[0].end_frame, 20);
    }

    #[test]
    fn test_caption_selection_is_strict() {
        let subs = vec![Subtitle {
            text: "caption".to_string(),
            start_frame: 10,
            end_frame: 20,
        }];

        assert_eq!(caption_for_frame(&subs, 9), "");
        assert_eq!(caption_for_frame(&subs, 10), "");
        assert_eq!(caption_for_frame(&subs, 11), "caption");
        assert_eq!(caption_for_frame(&subs, 19), "caption");
        assert_eq!(caption_for_frame(&subs, 20), "");
        assert_eq!(caption_for_frame(&subs, 21), "");
    }

    #[test]
    fn test_caption_no_cues() {
        assert_eq!(caption_for_frame(&[], 5), "");
    }
}
