//! Transparent shard decompression
//!
//! Shards ending in `.gz` are decoded on the fly with a streaming gzip
//! reader; plain shards are read through a buffered reader. Callers see the
//! same line-oriented interface for both.

use super::ShardError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Whether a path names a gzip-compressed file
pub fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open a shard for reading, decompressing it if needed
pub fn open_shard(path: &Path) -> Result<ShardReader, ShardError> {
    let file = File::open(path).map_err(|source| ShardError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let inner: Box<dyn Read + Send> = if is_compressed(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(ShardReader {
        path: path.to_path_buf(),
        reader: BufReader::new(inner),
        line: 0,
        buf: Vec::new(),
    })
}

/// Line reader over a plain or compressed shard
///
/// Lines are decoded lossily so a stray non-UTF-8 byte only affects the
/// line it sits on.
pub struct ShardReader {
    path: PathBuf,
    reader: BufReader<Box<dyn Read + Send>>,
    line: usize,
    buf: Vec<u8>,
}

impl ShardReader {
    /// Number of lines returned so far
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Read the next line without its terminator, `None` at end of stream
    ///
    /// A corrupt compressed stream surfaces here as [`ShardError::Read`].
    pub fn next_line(&mut self) -> Result<Option<String>, ShardError> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| ShardError::Read {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }

        self.line += 1;
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Read every remaining line
    pub fn read_all(mut self) -> Result<Vec<String>, ShardError> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            lines.push(line);
        }
        Ok(lines)
    }
}
