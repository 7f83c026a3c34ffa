// ErrWarden - platform/fs.rs
//
// Source log draining. Two strategies:
//
//   - Truncate (default): read the whole file, then truncate it to zero.
//     Bytes the web server appends between the read and the truncate are
//     lost. This window is inherent to the strategy and accepted.
//   - Offset: never modify the file. Remember how far it has been consumed
//     and read only what was appended since. A file that shrinks (rotation,
//     external truncation) is re-read from the start. A trailing line with
//     no newline yet is held back until it is complete. The offset lives in
//     memory only, so a restart re-reads the file from the beginning.
//
// Encoding: bytes are decoded as lossy UTF-8, only once a line is complete.

use crate::util::error::SourceError;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the source file is consumed each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainMode {
    #[default]
    Truncate,
    Offset,
}

impl DrainMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainMode::Truncate => "truncate",
            DrainMode::Offset => "offset",
        }
    }
}

impl fmt::Display for DrainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(DrainMode::Truncate),
            "offset" => Ok(DrainMode::Offset),
            other => Err(format!(
                "unknown drain mode \"{other}\", expected \"truncate\" or \"offset\""
            )),
        }
    }
}

/// Consumes new content from the source log according to a `DrainMode`.
#[derive(Debug)]
pub struct SourceDrain {
    path: PathBuf,
    mode: DrainMode,
    /// Bytes consumed so far (offset mode only).
    offset: u64,
    /// Bytes after the last newline of the previous read (offset mode only).
    /// Kept undecoded so a character split across reads survives intact.
    partial: Vec<u8>,
}

impl SourceDrain {
    pub fn new(path: PathBuf, mode: DrainMode) -> Self {
        Self {
            path,
            mode,
            offset: 0,
            partial: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> DrainMode {
        self.mode
    }

    /// Take everything that is ready to be parsed.
    pub fn drain(&mut self) -> Result<String, SourceError> {
        match self.mode {
            DrainMode::Truncate => self.drain_truncate(),
            DrainMode::Offset => self.drain_offset(),
        }
    }

    fn drain_truncate(&mut self) -> Result<String, SourceError> {
        let content = read_file_lossy(&self.path).map_err(|e| SourceError::Read {
            path: self.path.clone(),
            source: e,
        })?;

        truncate_file(&self.path).map_err(|e| SourceError::Truncate {
            path: self.path.clone(),
            source: e,
        })?;

        if !content.is_empty() {
            tracing::debug!(
                file = %self.path.display(),
                bytes = content.len(),
                "Drained and truncated source"
            );
        }
        Ok(content)
    }

    fn drain_offset(&mut self) -> Result<String, SourceError> {
        let current_size = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| SourceError::Metadata {
                path: self.path.clone(),
                source: e,
            })?;

        if current_size < self.offset {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.offset,
                new_size = current_size,
                "Source shrank (rotated or truncated), resetting offset to 0"
            );
            self.offset = 0;
            self.partial.clear();
        }

        if current_size == self.offset {
            return Ok(String::new());
        }

        let limit = (current_size - self.offset) as usize;
        let new_bytes =
            read_bytes_at(&self.path, self.offset, limit).map_err(|e| SourceError::Read {
                path: self.path.clone(),
                source: e,
            })?;
        self.offset += new_bytes.len() as u64;
        self.partial.extend_from_slice(&new_bytes);

        // Everything up to and including the final '\n' is complete.
        match self.partial.iter().rposition(|&b| b == b'\n') {
            Some(nl_pos) => {
                let rest = self.partial.split_off(nl_pos + 1);
                let complete = std::mem::replace(&mut self.partial, rest);
                tracing::debug!(
                    file = %self.path.display(),
                    bytes = complete.len(),
                    offset = self.offset,
                    "Read appended source content"
                );
                Ok(String::from_utf8_lossy(&complete).into_owned())
            }
            None => Ok(String::new()),
        }
    }
}

/// Read the full content of a file as a string.
///
/// For files with invalid UTF-8, uses lossy conversion.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Cut an existing file to zero length. Fails if the file does not exist.
pub fn truncate_file(path: &Path) -> io::Result<()> {
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_len(0)
}

/// Read up to `limit` bytes from `path` starting at byte position `offset`.
///
/// Returns fewer bytes than `limit` if the file ends before `limit` is reached.
fn read_bytes_at(path: &Path, offset: u64, limit: usize) -> io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}
