//! Line streaming with byte accounting
//!
//! Source files are consumed in a single forward pass. Each line reports
//! how many bytes it occupied on disk, terminator included, so progress
//! can be expressed against the file size without seeking.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// One line of source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number
    pub line_number: u32,
    /// Line text without its terminator
    pub text: String,
    /// Bytes the line occupied in the source, terminator included
    pub bytes: u64,
}

/// Streams lines from any buffered reader
///
/// Invalid UTF-8 is replaced with U+FFFD instead of failing the read.
pub struct GcodeLineReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u32,
    bytes_read: u64,
}

impl<R: BufRead> GcodeLineReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(256),
            line_number: 0,
            bytes_read: 0,
        }
    }

    /// Total bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Number of the last line returned
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// Read the next line, `Ok(None)` at end of input
    pub fn next_line(&mut self) -> io::Result<Option<SourceLine>> {
        self.buffer.clear();
        let read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if read == 0 {
            return Ok(None);
        }
        self.bytes_read += read as u64;
        self.line_number += 1;

        let mut end = self.buffer.len();
        while end > 0 && matches!(self.buffer[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        let text = String::from_utf8_lossy(&self.buffer[..end]).into_owned();

        Ok(Some(SourceLine {
            line_number: self.line_number,
            text,
            bytes: read as u64,
        }))
    }
}

impl<R: BufRead> Iterator for GcodeLineReader<R> {
    type Item = io::Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// G-code file opened for streaming
#[derive(Debug)]
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Create a new G-code file reader
    ///
    /// # Errors
    /// Returns error if the path does not exist or is not a regular file
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {}", path.display()));
        }

        if !path.is_file() {
            return Err(anyhow!("Path is not a file: {}", path.display()));
        }

        let file_size = fs::metadata(&path)?.len();
        Ok(Self { path, file_size })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and stream its lines
    ///
    /// # Errors
    /// Returns error if the file cannot be opened
    pub fn lines(&self) -> Result<GcodeLineReader<BufReader<File>>> {
        let file = File::open(&self.path)
            .map_err(|e| anyhow!("Failed to open {}: {}", self.path.display(), e))?;
        Ok(GcodeLineReader::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            file,
        )))
    }
}
