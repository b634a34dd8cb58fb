//! Source fingerprinting for change detection.
//!
//! A fingerprint records the sha256 of every input file of a compilation.
//! Comparing two fingerprints yields the files that were added, removed or
//! modified in between.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Compute the SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hashes of a compilation's input files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFingerprint {
    hashes: BTreeMap<PathBuf, String>,
}

impl SourceFingerprint {
    /// Hash every existing file in `sources`.
    pub fn compute<'a>(sources: impl IntoIterator<Item = &'a Path>) -> Result<Self> {
        let mut hashes = BTreeMap::new();
        for source in sources {
            if source.is_file() {
                hashes.insert(source.to_path_buf(), sha256_file(source)?);
            }
        }
        Ok(SourceFingerprint { hashes })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Files that differ between `self` (before) and `current`.
    pub fn changed_files(&self, current: &SourceFingerprint) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = current
            .hashes
            .iter()
            .filter(|(path, hash)| self.hashes.get(*path) != Some(*hash))
            .map(|(path, _)| path.clone())
            .collect();

        changed.extend(
            self.hashes
                .keys()
                .filter(|path| !current.hashes.contains_key(*path))
                .cloned(),
        );

        changed.sort();
        changed
    }
}
