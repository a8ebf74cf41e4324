//! JSON and JSON Lines report writers.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Report serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON document; collections are written as an array
    #[default]
    Json,
    /// One compact JSON value per line
    JsonLines,
}

impl OutputFormat {
    /// Parse a format name (`json`, `jsonl`, `jsonlines`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "jsonl" | "jsonlines" => Some(OutputFormat::JsonLines),
            _ => None,
        }
    }

    /// Guess from a file extension; `.jsonl` means JSON Lines, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => OutputFormat::JsonLines,
            _ => OutputFormat::Json,
        }
    }
}

/// Serializes report items to any writer.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    written: usize,
}

impl OutputWriter<BufWriter<File>> {
    /// Create `path` (truncating) and write to it.
    pub fn create(path: &Path, format: OutputFormat, pretty: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format, pretty))
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            written: 0,
        }
    }

    /// Write a single value: one document (JSON) or one line (JSON Lines).
    pub fn write<T: Serialize>(&mut self, item: &T) -> Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => serde_json::to_writer_pretty(&mut self.writer, item)?,
            OutputFormat::Json | OutputFormat::JsonLines => serde_json::to_writer(&mut self.writer, item)?,
        }
        writeln!(self.writer)?;
        self.written += 1;
        Ok(())
    }

    /// Write a collection: a single array (JSON) or one line per item (JSON Lines).
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items)?;
                }
                writeln!(self.writer)?;
                self.written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    /// Number of items serialized so far.
    pub fn items_written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write `items` to `path`, picking the format from its extension.
pub fn write_report<T: Serialize>(path: &Path, items: &[T]) -> Result<usize> {
    let mut writer = OutputWriter::create(path, OutputFormat::from_path(path), true)?;
    writer.write_all(items)?;
    let count = writer.items_written();
    writer.finish()?;
    Ok(count)
}
