//! Orphan detection between the peer tree and the manifest text.
//!
//! Both directions are textual: a directory counts as referenced when its
//! name occurs anywhere in the raw manifest, and manifest references are
//! extracted as path segments shaped like peer folder names.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Shape of a peer folder name embedded between path separators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenShape {
    /// One lowercase letter, a literal `.`, then digits (`a.1`).
    #[default]
    Strict,
    /// One lowercase letter, any one character, then digits. Matches the
    /// historical peer folder names such as `d1712345`.
    Legacy,
}

impl TokenShape {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Strict => strict_token_re(),
            Self::Legacy => legacy_token_re(),
        }
    }
}

fn strict_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\\/]([a-z]\.[0-9]+)[\\/]").expect("strict peer token regex must compile")
    })
}

fn legacy_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\\/]([a-z].[0-9]+)[\\/]").expect("legacy peer token regex must compile")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    /// Peer directories whose name never appears in the manifest text.
    #[serde(rename = "dirToJson")]
    pub directories_without_manifest_entry: Vec<String>,
    /// Peer tokens referenced by the manifest with no matching directory.
    #[serde(rename = "jsonToDir")]
    pub manifest_entries_without_directory: Vec<String>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.directories_without_manifest_entry.is_empty()
            && self.manifest_entries_without_directory.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directories_without_manifest_entry.len() + self.manifest_entries_without_directory.len()
    }
}

pub fn find_orphans(dirs: &[String], raw: &str) -> OrphanReport {
    find_orphans_with_shape(dirs, raw, TokenShape::Strict)
}

pub fn find_orphans_with_shape(dirs: &[String], raw: &str, shape: TokenShape) -> OrphanReport {
    let directories_without_manifest_entry = dirs
        .iter()
        .filter(|dir| !raw.contains(dir.as_str()))
        .cloned()
        .collect();

    let known: HashSet<&str> = dirs.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut manifest_entries_without_directory = Vec::new();
    for token in extract_peer_tokens(raw, shape) {
        if seen.insert(token) && !known.contains(token) {
            manifest_entries_without_directory.push(token.to_string());
        }
    }

    OrphanReport {
        directories_without_manifest_entry,
        manifest_entries_without_directory,
    }
}

/// Peer tokens in `raw`, left to right, repeats included.
///
/// Matches do not overlap: the closing separator of one token is consumed,
/// so in `/a.1/b.2/` only `a.1` is found.
pub fn extract_peer_tokens(raw: &str, shape: TokenShape) -> impl Iterator<Item = &str> {
    shape
        .regex()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}
