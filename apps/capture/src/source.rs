//! Where captures come from.
//!
//! Live camera capture and hand detection happen outside this crate; a
//! detector feeds captures through [`LandmarkSource`]. [`ReplaySource`] plays
//! back captures recorded as JSON lines, one `{"hands": [[[x, y, z], ...]]}`
//! object per frame.

use signsos_landmarks::Capture;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read captures: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub trait LandmarkSource: Send {
    /// Returns the newest capture, or `None` once the stream has ended.
    fn next_capture(&mut self) -> Result<Option<Capture>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct ReplaySource {
    captures: Vec<Capture>,
    cursor: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn open(path: &Path, looping: bool) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_captures(parse_lines(&raw)?, looping))
    }

    pub fn from_captures(captures: Vec<Capture>, looping: bool) -> Self {
        Self {
            captures,
            cursor: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

impl LandmarkSource for ReplaySource {
    fn next_capture(&mut self) -> Result<Option<Capture>, SourceError> {
        if self.cursor >= self.captures.len() {
            if !self.looping || self.captures.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let capture = self.captures[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(capture))
    }
}

fn parse_lines(raw: &str) -> Result<Vec<Capture>, SourceError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| SourceError::Parse { line: i + 1, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signsos_landmarks::HAND_LANDMARKS;
    use std::io::Write;

    fn line(hands: usize) -> String {
        let hand: Vec<[f32; 3]> = (0..HAND_LANDMARKS).map(|i| [i as f32, 0.5, 0.0]).collect();
        serde_json::json!({ "hands": vec![hand; hands] }).to_string()
    }

    #[test]
    fn replays_in_order_then_ends() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line(1)).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", line(2)).unwrap();

        let mut source = ReplaySource::open(file.path(), false).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.next_capture().unwrap().unwrap().hand_count(), 1);
        assert_eq!(source.next_capture().unwrap().unwrap().hand_count(), 2);
        assert!(source.next_capture().unwrap().is_none());
    }

    #[test]
    fn looping_wraps_around() {
        let captures = vec![Capture::default(), Capture::default()];
        let mut source = ReplaySource::from_captures(captures, true);
        for _ in 0..5 {
            assert!(source.next_capture().unwrap().is_some());
        }
    }

    #[test]
    fn empty_looping_source_ends() {
        let mut source = ReplaySource::from_captures(Vec::new(), true);
        assert!(source.next_capture().unwrap().is_none());
    }

    #[test]
    fn reports_bad_lines() {
        let raw = format!("{}\n{{\"hands\": 3}}\n", line(1));
        assert!(matches!(
            parse_lines(&raw),
            Err(SourceError::Parse { line: 2, .. })
        ));
    }
}
