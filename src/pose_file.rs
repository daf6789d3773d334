use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::TextEncoding;
use crate::error::PollError;
use crate::history::HistoryEntry;
use crate::sample::{parse_line, ParsedLine, SensorConversion};

const BOM: char = '\u{FEFF}';

/// Decodes raw file bytes. Invalid sequences become U+FFFD, which later fails
/// to parse and the line is skipped; a trailing odd byte (torn UTF-16 write) is
/// dropped.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> String {
    let text = match encoding {
        TextEncoding::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Utf16 => match bytes {
            [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
            [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
            _ => decode_utf16(bytes, u16::from_le_bytes),
        },
        TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
    };

    match text.strip_prefix(BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn decode_utf16(bytes: &[u8], word: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| word([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

pub fn latest_in(content: &str, conversion: &SensorConversion) -> Result<ParsedLine, PollError> {
    let mut lines = 0;
    for line in content.lines().rev() {
        lines += 1;
        match parse_line(line, conversion) {
            Ok(parsed) => return Ok(parsed),
            Err(err) => log::trace!("skipping line '{}': {}", line.trim(), err),
        }
    }
    Err(PollError::NoValidLine { lines })
}

#[derive(Debug)]
pub struct PoseFileReader {
    path: PathBuf,
    encoding: TextEncoding,
    conversion: SensorConversion,
    sequence: Arc<AtomicU64>,
    last_io_error: Option<ErrorKind>,
}

impl PoseFileReader {
    pub fn new(path: impl Into<PathBuf>, encoding: TextEncoding, conversion: SensorConversion) -> Self {
        Self {
            path: path.into(),
            encoding,
            conversion,
            sequence: Arc::new(AtomicU64::new(0)),
            last_io_error: None,
        }
    }

    pub fn with_sequence(self, sequence: Arc<AtomicU64>) -> Self {
        Self { sequence, ..self }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    // the file handle lives only for the read call
    pub async fn try_poll(&mut self) -> Result<HistoryEntry, PollError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PollError::SourceUnavailable {
                    path: self.path.clone(),
                })
            }
            Err(err) => return Err(PollError::IoTransient(err)),
        };

        let parsed = latest_in(&decode(&bytes, self.encoding), &self.conversion)?;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(HistoryEntry::new(seq, parsed))
    }

    pub async fn poll_once(&mut self) -> Option<HistoryEntry> {
        match self.try_poll().await {
            Ok(entry) => {
                self.last_io_error = None;
                Some(entry)
            }
            Err(PollError::IoTransient(err)) => {
                if self.last_io_error != Some(err.kind()) {
                    log::warn!("reading '{}' failed: {}", self.path.display(), err);
                    self.last_io_error = Some(err.kind());
                }
                None
            }
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sample::PoseSample;
    use std::io::Write;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn reader_for(file: &tempfile::NamedTempFile, encoding: TextEncoding) -> PoseFileReader {
        PoseFileReader::new(file.path(), encoding, SensorConversion::default())
    }

    #[test]
    fn decode_variants() {
        assert_eq!(decode(b"1.00, 2.00, 3.00", TextEncoding::Ascii), "1.00, 2.00, 3.00");

        let mut with_bom = vec![0xFF, 0xFE];
        with_bom.extend(utf16le("\u{2212}1.00, 2.00, 3.00"));
        assert_eq!(decode(&with_bom, TextEncoding::Utf16), "\u{2212}1.00, 2.00, 3.00");

        let big_endian: Vec<u8> = [0xFE, 0xFF]
            .into_iter()
            .chain("4, 5, 6".encode_utf16().flat_map(u16::to_be_bytes))
            .collect();
        assert_eq!(decode(&big_endian, TextEncoding::Utf16), "4, 5, 6");

        assert_eq!(decode(&utf16le("7, 8, 9"), TextEncoding::Utf16Le), "7, 8, 9");
    }

    #[test]
    fn decode_torn_utf16() {
        let mut bytes = utf16le("1, 2, 3\n4, 5");
        bytes.push(b'6');
        assert_eq!(decode(&bytes, TextEncoding::Utf16Le), "1, 2, 3\n4, 5");
    }

    #[test]
    fn scans_backwards_past_torn_line() {
        let conv = SensorConversion::default();
        let parsed = latest_in("0.00, 0.00, 0.00\n1.00, 2.00, 3.00\n4.00, 5.", &conv).unwrap();
        assert_eq!(parsed.pose, PoseSample::new(1.0, 2.0, 3.0));

        let parsed = latest_in("1.00, 2.00, 3.00\r\n9.00, 9.00, 9.00\r\n", &conv).unwrap();
        assert_eq!(parsed.pose, PoseSample::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn nothing_parses() {
        let conv = SensorConversion::default();
        assert!(matches!(
            latest_in("garbage\n1,2\n", &conv),
            Err(PollError::NoValidLine { lines: 2 })
        ));
        assert!(matches!(
            latest_in("", &conv),
            Err(PollError::NoValidLine { lines: 0 })
        ));
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = PoseFileReader::new(
            dir.path().join("pose.txt"),
            TextEncoding::Ascii,
            SensorConversion::default(),
        );
        assert!(reader.poll_once().await.is_none());
        assert!(matches!(
            reader.try_poll().await,
            Err(PollError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn reads_latest_valid_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1.00, 2.00, 3.00\n10.00, 20.00, 30.00\n11.0").unwrap();
        file.flush().unwrap();

        let mut reader = reader_for(&file, TextEncoding::Ascii);
        let entry = reader.poll_once().await.unwrap();
        assert_eq!(entry.pose, PoseSample::new(10.0, 20.0, 30.0));
        assert_eq!(entry.seq, 0);

        let entry = reader.poll_once().await.unwrap();
        assert_eq!(entry.seq, 1);
    }

    #[tokio::test]
    async fn reads_utf16_with_distances() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(utf16le("\u{2212}45.00, 12.00, 90.00, 254.00, 30000.00"));
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let mut reader = reader_for(&file, TextEncoding::Utf16);
        let entry = reader.poll_once().await.unwrap();
        assert_eq!(entry.pose.x, -45.0);
        let reading = entry.reading.unwrap();
        assert!(reading.right.is_some());
        assert!(reading.left.is_none());
    }

    #[tokio::test]
    async fn malformed_file_is_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not, a, pose").unwrap();
        file.flush().unwrap();

        let mut reader = reader_for(&file, TextEncoding::Ascii);
        assert!(reader.poll_once().await.is_none());
    }

    #[tokio::test]
    async fn unreadable_path_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.txt");
        std::fs::create_dir(&path).unwrap();

        let mut reader =
            PoseFileReader::new(&path, TextEncoding::Ascii, SensorConversion::default());
        assert!(matches!(
            reader.try_poll().await,
            Err(PollError::IoTransient(_))
        ));
        assert!(reader.poll_once().await.is_none());
        assert!(reader.last_io_error.is_some());

        std::fs::remove_dir(&path).unwrap();
        std::fs::write(&path, "1.00, 2.00, 3.00").unwrap();
        let entry = reader.poll_once().await.unwrap();
        assert_eq!(entry.pose, PoseSample::new(1.0, 2.0, 3.0));
        assert!(reader.last_io_error.is_none());
    }

    #[tokio::test]
    async fn shared_sequence_spans_readers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1.00, 2.00, 3.00").unwrap();
        file.flush().unwrap();

        let sequence = Arc::new(AtomicU64::new(0));
        let mut first = reader_for(&file, TextEncoding::Ascii).with_sequence(sequence.clone());
        let mut second = reader_for(&file, TextEncoding::Ascii).with_sequence(sequence);

        assert_eq!(first.poll_once().await.unwrap().seq, 0);
        assert_eq!(second.poll_once().await.unwrap().seq, 1);
        assert_eq!(first.poll_once().await.unwrap().seq, 2);
    }
}
