//! GenBank record reader built on [gb_io](https://docs.rs/gb-io).
//!
//! Each LOCUS entry becomes one [`GenomeRecord`]. Genes are the CDS features
//! that carry a `/translation`; CDS features without one are skipped.

use std::io::Read;
use std::path::Path;

use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Location, Seq};

use super::{LoadError, open_maybe_gz};
use crate::core::sequence::{Gene, GenomeRecord, NucleotideSequence, PeptideSequence, Strand};

pub fn read_genbank_file(path: &Path) -> Result<Vec<GenomeRecord>, LoadError> {
    let reader = open_maybe_gz(path)?;
    parse_genbank(reader, path)
}

/// Parse every record in `reader`; `path` names the source in errors and
/// in fallback record names.
pub fn parse_genbank<R: Read>(reader: R, path: &Path) -> Result<Vec<GenomeRecord>, LoadError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".to_string());

    let mut records = Vec::new();
    for (index, seq) in SeqReader::new(reader).enumerate() {
        let seq = seq.map_err(|e| LoadError::MalformedRecord {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let fallback = if index == 0 {
            stem.clone()
        } else {
            format!("{stem}_{}", index + 1)
        };
        records.push(record_from_seq(seq, fallback));
    }

    if records.is_empty() {
        return Err(LoadError::MalformedRecord {
            path: path.to_path_buf(),
            message: "no GenBank records found".to_string(),
        });
    }
    Ok(records)
}

fn record_from_seq(seq: Seq, fallback_name: String) -> GenomeRecord {
    let name = seq
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name);
    let len = seq.seq.len();

    let mut genes = Vec::new();
    let mut cds_index = 0usize;
    for feature in &seq.features {
        if !feature.kind.to_string().eq_ignore_ascii_case("CDS") {
            continue;
        }
        cds_index += 1;
        match gene_from_feature(feature, len, &name, cds_index) {
            Some(gene) => genes.push(gene),
            None => log::debug!("{name}: skipping CDS #{cds_index} (no translation or bounds)"),
        }
    }

    log::debug!("{name}: {len} bp, {} genes", genes.len());
    GenomeRecord::new(name, NucleotideSequence::new(seq.seq), genes)
}

fn gene_from_feature(feature: &Feature, len: usize, record: &str, index: usize) -> Option<Gene> {
    let translation: Vec<u8> = feature
        .qualifier_values("translation".into())
        .next()?
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if translation.is_empty() {
        return None;
    }

    let (from, to) = feature.location.find_bounds().ok()?;
    let from = usize::try_from(from).ok()?;
    let to = usize::try_from(to).ok()?;
    if from >= to || to > len {
        return None;
    }

    let name = ["locus_tag", "gene"]
        .iter()
        .find_map(|key| feature.qualifier_values((*key).into()).next())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{record}_cds{index}"));

    // gb_io bounds are 0-based, end-exclusive.
    let (location, strand) = if is_reverse(&feature.location) {
        (len - to + 1, Strand::Reverse)
    } else {
        (from + 1, Strand::Forward)
    };
    Some(Gene::new(
        name,
        location,
        strand,
        PeptideSequence::new(translation),
    ))
}

/// A location is on the reverse strand when most of its ranges sit under an
/// odd number of `complement(...)` wrappers.
fn is_reverse(location: &Location) -> bool {
    fn collect(location: &Location, reverse: bool, strands: &mut Vec<bool>) {
        match location {
            Location::Range(_, _) | Location::Between(_, _) => strands.push(reverse),
            Location::Complement(inner) => collect(inner, !reverse, strands),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => {
                for part in parts {
                    collect(part, reverse, strands);
                }
            }
            Location::External(_, inner) => {
                if let Some(inner) = inner {
                    collect(inner, reverse, strands);
                }
            }
            Location::Gap(_) => {}
        }
    }

    let mut strands = Vec::new();
    collect(location, false, &mut strands);
    strands.iter().filter(|&&r| r).count() * 2 > strands.len()
}
