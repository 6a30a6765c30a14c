//! Shared consensus table.
//!
//! The key set (one bucket per reference gene plus [`ALL_BUCKET`]) is fixed
//! when the table is built and never changes afterwards, so workers only
//! contend on individual entries. Each entry has its own lock.
//!
//! Adding a match locks the reference bucket and then the `all` bucket and
//! updates both before releasing either. Every writer takes the two locks in
//! that order and `all` is never taken first, so there is no lock cycle.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;

use super::Sigma70Consensus;
use crate::core::promoter::Match;

/// Bucket that mirrors every match regardless of reference gene.
pub const ALL_BUCKET: &str = "all";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no consensus bucket named {0:?}")]
    UnknownBucket(String),

    #[error("bucket name {0:?} is reserved")]
    ReservedBucket(String),

    #[error("duplicate consensus bucket {0:?}")]
    DuplicateBucket(String),
}

pub struct ConsensusTable {
    buckets: BTreeMap<String, Mutex<Sigma70Consensus>>,
}

impl ConsensusTable {
    /// Build a table with one bucket per name plus `all`.
    pub fn seeded<I, S>(names: I) -> Result<Self, AggregateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets = BTreeMap::new();
        for name in names {
            let name = name.into();
            if name == ALL_BUCKET {
                return Err(AggregateError::ReservedBucket(name));
            }
            if buckets.contains_key(&name) {
                return Err(AggregateError::DuplicateBucket(name));
            }
            buckets.insert(name, Mutex::new(Sigma70Consensus::new()));
        }
        buckets.insert(ALL_BUCKET.to_string(), Mutex::new(Sigma70Consensus::new()));
        Ok(Self { buckets })
    }

    /// Fold `m` into `bucket` and into `all` as one update.
    ///
    /// An unknown bucket leaves the table untouched.
    pub fn add_match(&self, bucket: &str, m: &Match) -> Result<(), AggregateError> {
        if bucket == ALL_BUCKET {
            return Err(AggregateError::ReservedBucket(bucket.to_string()));
        }
        let entry = self
            .buckets
            .get(bucket)
            .ok_or_else(|| AggregateError::UnknownBucket(bucket.to_string()))?;
        let all = self
            .buckets
            .get(ALL_BUCKET)
            .ok_or_else(|| AggregateError::UnknownBucket(ALL_BUCKET.to_string()))?;

        let mut entry = entry.lock();
        let mut all = all.lock();
        entry.add_match(m);
        all.add_match(m);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// Copy of every bucket. Meant to be taken once all writers are done.
    pub fn snapshot(&self) -> ConsensusSnapshot {
        ConsensusSnapshot {
            entries: self
                .buckets
                .iter()
                .map(|(name, entry)| (name.clone(), entry.lock().clone()))
                .collect(),
        }
    }

    /// Consume the table once the run has finished.
    pub fn into_snapshot(self) -> ConsensusSnapshot {
        ConsensusSnapshot {
            entries: self
                .buckets
                .into_iter()
                .map(|(name, entry)| (name, entry.into_inner()))
                .collect(),
        }
    }
}

impl fmt::Debug for ConsensusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsensusTable")
            .field("buckets", &self.buckets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read-only view of a finished consensus table, ordered by bucket name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsensusSnapshot {
    entries: BTreeMap<String, Sigma70Consensus>,
}

impl ConsensusSnapshot {
    pub fn get(&self, bucket: &str) -> Option<&Sigma70Consensus> {
        self.entries.get(bucket)
    }

    pub fn all(&self) -> Option<&Sigma70Consensus> {
        self.get(ALL_BUCKET)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Sigma70Consensus)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reference-gene buckets only.
    pub fn references(&self) -> impl Iterator<Item = (&str, &Sigma70Consensus)> {
        self.iter().filter(|(k, _)| *k != ALL_BUCKET)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compare the printed form of every bucket in `self` and `other`.
    pub fn equivalence(&self, other: &ConsensusSnapshot) -> EquivalenceReport {
        let mut mismatched = Vec::new();
        for key in self.entries.keys().chain(other.entries.keys()) {
            if mismatched.contains(key) {
                continue;
            }
            let left = self.entries.get(key).map(ToString::to_string);
            let right = other.entries.get(key).map(ToString::to_string);
            if left != right {
                mismatched.push(key.clone());
            }
        }
        mismatched.sort();
        EquivalenceReport {
            compared: self.entries.len().max(other.entries.len()),
            mismatched,
        }
    }
}

impl fmt::Display for ConsensusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in &self.entries {
            writeln!(f, "{name} {entry}")?;
        }
        Ok(())
    }
}

/// Outcome of comparing two snapshots bucket by bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceReport {
    pub compared: usize,
    pub mismatched: Vec<String>,
}

impl EquivalenceReport {
    pub fn is_equivalent(&self) -> bool {
        self.mismatched.is_empty()
    }
}
