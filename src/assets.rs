//! # Asset Indexing
//!
//! Turns an unordered collection of uploaded QR image files into a
//! numero-keyed index. File names carry the key as a run of digits:
//! `0123-etiqueta.png` keys on the pre-hyphen segment, `LOTE-0123.png`
//! falls back to the digits anywhere in the stem.
//!
//! Unsupported extensions and duplicate keys are dropped with a warning;
//! indexing never fails on a single bad file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::Result;

/// Supported uploaded QR formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Png,
    Svg,
}

impl AssetKind {
    /// Infer the kind from a filename suffix; `None` for anything else.
    pub fn from_file_name(name: &str) -> Option<AssetKind> {
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "png" => Some(AssetKind::Png),
            "svg" => Some(AssetKind::Svg),
            _ => None,
        }
    }
}

/// One indexed QR file, immutable after the upload batch is indexed.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Numero key extracted from the filename.
    pub key: String,
    pub bytes: Vec<u8>,
    pub kind: AssetKind,
    pub file_name: String,
    /// Pre-hyphen filename segment, used as a friendly label fallback.
    pub base_name: String,
}

/// Insertion-ordered key → asset map.
///
/// Iteration order is the order files were accepted, which the resolver
/// relies on when no manifest is present.
#[derive(Debug, Default)]
pub struct AssetIndex {
    order: Vec<String>,
    by_key: HashMap<String, UploadedAsset>,
    /// Secondary lookup for all-digit keys by numeric value, so a manifest
    /// numero `45` matches an asset keyed `045`. First-seen key wins.
    by_value: HashMap<u128, String>,
}

impl AssetIndex {
    /// Index an upload batch given as `(file_name, bytes)` pairs.
    pub fn from_files<I, S>(files: I) -> AssetIndex
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let mut index = AssetIndex::default();
        for (name, bytes) in files {
            index.insert(name.as_ref(), bytes);
        }
        index
    }

    /// Index every regular file in a directory, sorted by file name so the
    /// result is stable across platforms.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<AssetIndex> {
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        let mut index = AssetIndex::default();
        for name in names {
            let bytes = fs::read(dir.as_ref().join(&name))?;
            index.insert(&name, bytes);
        }
        Ok(index)
    }

    fn insert(&mut self, file_name: &str, bytes: Vec<u8>) {
        let Some(kind) = AssetKind::from_file_name(file_name) else {
            warn!(file = file_name, "file skipped: unsupported extension");
            return;
        };
        let key = extract_key_from_file_name(file_name);
        if key.is_empty() {
            warn!(file = file_name, "file skipped: no usable QR key in the filename");
            return;
        }
        if self.by_key.contains_key(&key) {
            warn!(file = file_name, key = %key, "duplicate QR key, keeping the first file");
            return;
        }
        let base = base_name_from_file(file_name);
        let base_name = if base.is_empty() { key.clone() } else { base };
        if let Ok(value) = key.parse::<u128>() {
            self.by_value.entry(value).or_insert_with(|| key.clone());
        }
        self.order.push(key.clone());
        self.by_key.insert(
            key.clone(),
            UploadedAsset {
                key,
                bytes,
                kind,
                file_name: file_name.to_string(),
                base_name,
            },
        );
    }

    /// Look up an asset by numero key. All-digit keys also match by numeric
    /// value, so zero-padded asset names pair with plain manifest numbers.
    pub fn get(&self, numero_key: &str) -> Option<&UploadedAsset> {
        if let Some(asset) = self.by_key.get(numero_key) {
            return Some(asset);
        }
        let value = numero_key.parse::<u128>().ok()?;
        let key = self.by_value.get(&value)?;
        self.by_key.get(key)
    }

    /// Iterate accepted assets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UploadedAsset> {
        self.order.iter().filter_map(|k| self.by_key.get(k))
    }

    /// Number of accepted files.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Filename without its extension.
fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Friendly label derived from the pre-hyphen segment of the filename.
///
/// A segment ending in digits with a non-empty prefix is re-joined as
/// `prefix-digits` (`FOO12` → `FOO-12`) so the label reads like a lot code.
pub fn base_name_from_file(name: &str) -> String {
    let stem = file_stem(name);
    let before_hyphen = stem.split('-').next().unwrap_or(stem).trim();
    if let Some((prefix, digits)) = split_trailing_digits(before_hyphen) {
        let prefix = prefix.trim();
        if !prefix.is_empty() {
            return format!("{prefix}-{digits}");
        }
    }
    before_hyphen.to_string()
}

/// Numero key extracted from a filename.
///
/// The last run of digits in the pre-hyphen segment wins; if that segment
/// carries no digits, the last run anywhere in the stem is used; with no
/// digits at all the trimmed segment itself becomes the key.
pub fn extract_key_from_file_name(name: &str) -> String {
    let stem = file_stem(name);
    let before_hyphen = stem.split('-').next().unwrap_or(stem).trim();
    if let Some(digits) = last_digit_run(before_hyphen) {
        return digits.to_string();
    }
    if let Some(digits) = last_digit_run(stem) {
        return digits.to_string();
    }
    before_hyphen.to_string()
}

/// Split `text` into `(prefix, trailing_digits)`; `None` when it does not
/// end in a digit.
fn split_trailing_digits(text: &str) -> Option<(&str, &str)> {
    let split = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some((&text[..split], &text[split..]))
}

/// Last maximal run of ASCII digits in `text`.
fn last_digit_run(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    while end > 0 {
        if bytes[end - 1].is_ascii_digit() {
            let mut start = end;
            while start > 0 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            return Some(&text[start..end]);
        }
        end -= 1;
    }
    None
}
