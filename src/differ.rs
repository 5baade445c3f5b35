use crate::{MAX_ROWS, REFRESH_INTERVAL_SECS};
use log::trace;

/// Compact encoding of one row relative to its predecessor at the same index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowInstruction {
    /// Full row content
    Literal(String),
    /// Row is byte-identical to the same row of the previous frame
    Empty,
    /// First `skip` columns match the previous row; `suffix` is the rest
    SkipPrefix { skip: usize, suffix: String },
}

impl RowInstruction {
    /// Serialize to one wire line (without the trailing newline).
    ///
    /// `SkipPrefix` becomes a cursor-forward escape so the line is
    /// self-decoding when replayed through a terminal.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Empty => String::new(),
            Self::SkipPrefix { skip, suffix } => format!("\x1b[{}C{}", skip, suffix),
        }
    }

    /// Reconstruct the full row this instruction encodes, given the
    /// previous frame's row at the same index.
    pub fn apply(&self, prev: &str) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Empty => prev.to_string(),
            Self::SkipPrefix { skip, suffix } => {
                let kept: String = prev.chars().take(*skip).collect();
                kept + suffix
            }
        }
    }
}

/// Per-row delta encoder.
///
/// Owns the last-row cache: one row of text per row index, overwritten
/// on every frame. No full frame history is kept.
#[derive(Debug, Default)]
pub struct FrameDiffer {
    cache: Vec<String>,
}

impl FrameDiffer {
    /// Create a differ with an empty cache (first frame encodes as literals)
    pub fn new() -> Self {
        Self { cache: Vec::new() }
    }

    /// Encode one frame's rows against the previous frame.
    ///
    /// The cache is updated to the new rows unconditionally, including
    /// for rows emitted as `Empty` or `SkipPrefix`.
    pub fn encode_frame(&mut self, rows: &[String], force_refresh: bool) -> Vec<RowInstruction> {
        let instructions = rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.encode_row(index, row, force_refresh))
            .collect();

        for (index, row) in rows.iter().enumerate().take(MAX_ROWS) {
            if index < self.cache.len() {
                self.cache[index] = row.clone();
            } else {
                self.cache.push(row.clone());
            }
        }

        instructions
    }

    fn encode_row(&self, index: usize, row: &str, force_refresh: bool) -> RowInstruction {
        // Rows past the cache bound are never diffed
        if force_refresh || index >= MAX_ROWS {
            return RowInstruction::Literal(row.to_string());
        }

        let prev = match self.cache.get(index) {
            Some(prev) => prev,
            None => return RowInstruction::Literal(row.to_string()),
        };

        if row == prev {
            return RowInstruction::Empty;
        }

        let skip = common_prefix_columns(prev, row);
        if skip == 0 {
            return RowInstruction::Literal(row.to_string());
        }

        let suffix_start = row
            .char_indices()
            .nth(skip)
            .map_or(row.len(), |(byte, _)| byte);
        trace!("row {}: {} columns unchanged", index, skip);

        RowInstruction::SkipPrefix {
            skip,
            suffix: row[suffix_start..].to_string(),
        }
    }

    /// Number of rows currently cached
    pub fn cached_rows(&self) -> usize {
        self.cache.len()
    }
}

/// Longest common prefix of two rows in character columns.
///
/// Comparison stops at the first mismatch or at the end of either
/// string; a previous row shorter than the candidate prefix simply caps
/// the match.
fn common_prefix_columns(prev: &str, row: &str) -> usize {
    prev.chars()
        .zip(row.chars())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Forced-refresh policy: a full re-emission of every row every
/// `REFRESH_INTERVAL_SECS` worth of frames, bounding error accumulation
/// from partial updates and keeping resume points self-contained.
pub fn is_refresh_frame(frame_index: u64, fps: u32) -> bool {
    let interval = u64::from(REFRESH_INTERVAL_SECS) * u64::from(fps.max(1));
    frame_index % interval == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_first_frame_is_all_literals() {
        let mut differ = FrameDiffer::new();
        let encoded = differ.encode_frame(&rows(&["XXXX", "YYYY"]), false);

        assert_eq!(
            encoded,
            vec![
                RowInstruction::Literal("XXXX".to_string()),
                RowInstruction::Literal("YYYY".to_string()),
            ]
        );
        assert_eq!(differ.cached_rows(), 2);
    }

    #[test]
    fn test_two_frame_scenario() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["XXXX", "YYYY"]), false);
        let encoded = differ.encode_frame(&rows(&["XXYY", "YYYY"]), false);

        assert_eq!(
            encoded,
            vec![
                RowInstruction::SkipPrefix {
                    skip: 2,
                    suffix: "YY".to_string()
                },
                RowInstruction::Empty,
            ]
        );
    }

    #[test]
    fn test_forced_refresh_always_literal() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["AAAA"]), false);
        let encoded = differ.encode_frame(&rows(&["AAAA"]), true);

        assert_eq!(encoded, vec![RowInstruction::Literal("AAAA".to_string())]);
    }

    #[test]
    fn test_no_common_prefix_is_literal() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["ABCD"]), false);
        let encoded = differ.encode_frame(&rows(&["ZBCD"]), false);

        assert_eq!(encoded, vec![RowInstruction::Literal("ZBCD".to_string())]);
    }

    #[test]
    fn test_previous_row_shorter_caps_prefix() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["AB"]), false);
        let encoded = differ.encode_frame(&rows(&["ABCD"]), false);

        assert_eq!(
            encoded,
            vec![RowInstruction::SkipPrefix {
                skip: 2,
                suffix: "CD".to_string()
            }]
        );
    }

    #[test]
    fn test_current_row_is_prefix_of_previous() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["ABCD"]), false);
        let encoded = differ.encode_frame(&rows(&["AB"]), false);

        // skip == len(row): empty suffix, the trailing columns are dropped
        assert_eq!(
            encoded,
            vec![RowInstruction::SkipPrefix {
                skip: 2,
                suffix: String::new()
            }]
        );
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("XXXX", "XXYY"),
            ("⠁⠂⠃⠄", "⠁⠂⠅⠄"),
            ("", "ABCD"),
            ("ABCD", "ABCD"),
            ("short", "a completely different row"),
        ];

        for (prev, current) in cases {
            let mut differ = FrameDiffer::new();
            differ.encode_frame(&rows(&[prev]), false);
            let encoded = differ.encode_frame(&rows(&[current]), false);
            assert_eq!(
                encoded[0].apply(prev),
                current,
                "round trip failed for {:?} -> {:?}",
                prev,
                current
            );
        }
    }

    #[test]
    fn test_prefix_correctness_on_braille() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["⠁⠂⠃⠄"]), false);
        let encoded = differ.encode_frame(&rows(&["⠁⠂⠅⠄"]), false);

        // Columns, not bytes: braille code points are 3 bytes each
        assert_eq!(
            encoded,
            vec![RowInstruction::SkipPrefix {
                skip: 2,
                suffix: "⠅⠄".to_string()
            }]
        );
    }

    #[test]
    fn test_wire_encoding() {
        let literal = RowInstruction::Literal("ABC".to_string());
        assert_eq!(literal.to_wire(), "ABC");

        assert_eq!(RowInstruction::Empty.to_wire(), "");

        let skip = RowInstruction::SkipPrefix {
            skip: 7,
            suffix: "tail".to_string(),
        };
        assert_eq!(skip.to_wire(), "\x1b[7Ctail");
    }

    #[test]
    fn test_refresh_policy() {
        assert!(is_refresh_frame(0, 10));
        assert!(!is_refresh_frame(1, 10));
        assert!(!is_refresh_frame(19, 10));
        assert!(is_refresh_frame(20, 10));
        assert!(is_refresh_frame(40, 10));
    }

    #[test]
    fn test_cache_grows_with_frame_height() {
        let mut differ = FrameDiffer::new();
        differ.encode_frame(&rows(&["A"]), false);
        let encoded = differ.encode_frame(&rows(&["A", "B"]), false);

        // Row 1 has no predecessor and must come out literal
        assert_eq!(
            encoded,
            vec![
                RowInstruction::Empty,
                RowInstruction::Literal("B".to_string())
            ]
        );
        assert_eq!(differ.cached_rows(), 2);
    }
}
