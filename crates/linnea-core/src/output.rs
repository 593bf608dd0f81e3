//! JSON and JSONL output for evaluation records and hierarchies.
//!
//! Per-sample records are appended as they are produced; JSONL keeps partial
//! runs usable, JSON is offered for small result files that get read back.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serializes records to an underlying writer in JSON or JSONL form.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    records_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer. `pretty` only affects the JSON format;
    /// JSONL is always one compact object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            records_written: 0,
        }
    }

    /// Write a single record followed by a newline.
    pub fn write<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, record).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// Write a batch: a JSON array for the JSON format, one line per record
    /// for JSONL.
    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, records)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, records).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.records_written += records.len();
            }
            OutputFormat::JsonLines => {
                for record in records {
                    self.write(record)?;
                }
            }
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write a value as pretty JSON to a file, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Rec {
        id: usize,
        label: String,
    }

    fn rec(id: usize) -> Rec {
        Rec {
            id,
            label: format!("class_{id}"),
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("ndjson"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("csv"), None);
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let mut buf = Vec::new();
        let mut writer = OutputWriter::new(&mut buf, OutputFormat::JsonLines, false);
        writer.write_all(&[rec(1), rec(2), rec(3)]).unwrap();
        assert_eq!(writer.records_written(), 3);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let parsed: Rec = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, rec(2));
    }

    #[test]
    fn test_json_array_output() {
        let mut buf = Vec::new();
        let mut writer = OutputWriter::new(&mut buf, OutputFormat::Json, false);
        writer.write_all(&[rec(1), rec(2)]).unwrap();

        let parsed: Vec<Rec> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_jsonl_never_pretty() {
        let mut buf = Vec::new();
        let mut writer = OutputWriter::new(&mut buf, OutputFormat::JsonLines, true);
        writer.write(&rec(1)).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_write_json_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_json_file(&path, &rec(9)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Rec = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.id, 9);
    }
}
