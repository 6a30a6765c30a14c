//! Reference-gene list reader.
//!
//! The list alternates lines: a gene name, then its peptide sequence.
//! Trailing whitespace is trimmed and blank lines between pairs are skipped.
//!
//! Names must be unique. A repeated name is rejected with
//! [`LoadError::DuplicateReference`] rather than folded into the first gene's
//! consensus bucket, even when both entries carry the same peptide, so every
//! bucket in a report belongs to exactly one reference sequence.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{LoadError, open_maybe_gz};
use crate::core::consensus::ALL_BUCKET;
use crate::core::sequence::{Gene, PeptideSequence};

pub fn read_reference_genes(path: &Path) -> Result<Vec<Gene>, LoadError> {
    let reader = BufReader::new(open_maybe_gz(path)?);
    let genes = parse_reference_genes(reader, path)?;
    log::info!(
        "Loaded {} reference genes from {}",
        genes.len(),
        path.display()
    );
    Ok(genes)
}

/// Parse a reference list; `path` is only used in error messages.
pub fn parse_reference_genes<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Gene>, LoadError> {
    let mut genes = Vec::new();
    let mut seen = HashSet::new();
    let mut lines = reader
        .lines()
        .map(|line| line.map(|l| l.trim_end().to_string()))
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()));

    while let Some(name) = lines.next() {
        let name = name.map_err(|e| LoadError::io(path, e))?;
        let sequence = match lines.next() {
            Some(line) => line.map_err(|e| LoadError::io(path, e))?,
            None => {
                return Err(LoadError::Truncated {
                    path: path.to_path_buf(),
                    name,
                });
            }
        };
        if name == ALL_BUCKET {
            return Err(LoadError::ReservedName {
                path: path.to_path_buf(),
                name,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(LoadError::DuplicateReference {
                path: path.to_path_buf(),
                name,
            });
        }
        genes.push(Gene::reference(name, PeptideSequence::new(sequence)));
    }
    Ok(genes)
}
