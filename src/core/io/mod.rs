//! Input readers: the reference-gene list and GenBank genome records.

pub mod discovery;
pub mod genbank;
pub mod reference_genes;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub use discovery::list_record_files;
pub use genbank::{parse_genbank, read_genbank_file};
pub use reference_genes::{parse_reference_genes, read_reference_genes};

const BUFFER_SIZE: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: malformed GenBank record: {message}")]
    MalformedRecord { path: PathBuf, message: String },

    #[error("{path}: reference gene {name:?} has no sequence line")]
    Truncated { path: PathBuf, name: String },

    #[error("{path}: duplicate reference gene {name:?}")]
    DuplicateReference { path: PathBuf, name: String },

    #[error("{path}: reference gene name {name:?} is reserved")]
    ReservedName { path: PathBuf, name: String },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors confined to a single record file.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, LoadError::MalformedRecord { .. })
    }
}

/// Open a file for buffered reading, decompressing `.gz` files (by extension
/// or gzip magic bytes).
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read + Send>, LoadError> {
    let mut file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let gz_extension = path.extension().is_some_and(|ext| ext == "gz");
    let gz_magic = has_gzip_magic(&mut file).map_err(|e| LoadError::io(path, e))?;
    // Reopen so the reader starts at byte 0.
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;

    if gz_extension || gz_magic {
        log::debug!("Reading {} as gzip", path.display());
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Files shorter than the two magic bytes are plain.
fn has_gzip_magic<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    match reader.read_exact(&mut magic) {
        Ok(()) => Ok(magic == [0x1f, 0x8b]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}
