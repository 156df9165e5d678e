//! Loading a dump file into memory.
//!
//! Compressed dumps are decompressed transparently based on the file
//! extension. The whole text is materialised, then fingerprinted so a
//! diagnostics report can be matched to the exact input it describes.

use crate::error::{Error, Result};
use crate::progress::ProgressReader;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// A dump loaded into memory.
#[derive(Debug, Clone)]
pub struct DumpSource {
    pub path: PathBuf,
    pub text: String,
    /// Size of the file on disk
    pub file_bytes: u64,
    pub compression: Compression,
    /// Hex SHA-256 of the decompressed bytes
    pub sha256: String,
    /// Whether invalid UTF-8 had to be replaced
    pub lossy: bool,
}

impl DumpSource {
    /// Build a source from text already in memory.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            path: path.into(),
            file_bytes: text.len() as u64,
            sha256: sha256_hex(text.as_bytes()),
            text,
            compression: Compression::None,
            lossy: false,
        }
    }
}

/// Read a dump file, decompressing it if needed.
pub fn read_dump(path: &Path) -> Result<DumpSource> {
    read_dump_with_progress(path, |_| {})
}

/// Read a dump file, reporting bytes read from disk through `progress`.
pub fn read_dump_with_progress<F>(path: &Path, progress: F) -> Result<DumpSource>
where
    F: Fn(u64) + Send + 'static,
{
    let unreadable = |source| Error::DumpUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unreadable)?;
    let file_bytes = file.metadata().map_err(unreadable)?.len();
    let compression = Compression::from_path(path);
    debug!(path = %path.display(), file_bytes, %compression, "reading dump");

    let reader: Box<dyn Read> = Box::new(ProgressReader::new(
        BufReader::with_capacity(256 * 1024, file),
        progress,
    ));
    let mut reader = compression.wrap_reader(reader).map_err(unreadable)?;

    let mut bytes = Vec::with_capacity(file_bytes as usize);
    reader.read_to_end(&mut bytes).map_err(unreadable)?;

    let sha256 = sha256_hex(&bytes);
    let (text, lossy) = match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => {
            warn!(path = %path.display(), "dump is not valid UTF-8; invalid bytes replaced");
            (String::from_utf8_lossy(e.as_bytes()).into_owned(), true)
        }
    };

    Ok(DumpSource {
        path: path.to_path_buf(),
        text,
        file_bytes,
        compression,
        sha256,
        lossy,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
