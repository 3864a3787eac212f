//! Flat ZIP packaging of exported outputs.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::batch::NamedBlob;
use crate::error::{EtiquetadorError, Result};

/// Package the blobs into a single flat ZIP archive, preserving order.
///
/// Entry names are used as-is; callers are responsible for uniqueness.
pub fn create_zip(blobs: &[NamedBlob]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for blob in blobs {
        writer
            .start_file(blob.name.as_str(), options)
            .map_err(|e| EtiquetadorError::Export(format!("ZIP entry '{}': {e}", blob.name)))?;
        writer.write_all(&blob.bytes)?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| EtiquetadorError::Export(format!("ZIP finalization failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn blob(name: &str, bytes: &[u8]) -> NamedBlob {
        NamedBlob {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn read_entry(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, index: usize) -> (String, Vec<u8>) {
        let mut entry = archive.by_index(index).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        (entry.name().to_string(), bytes)
    }

    #[test]
    fn entries_round_trip_in_order() {
        let bytes = create_zip(&[
            blob("caja-1.png", b"first"),
            blob("caja-2.png", b"second"),
        ])
        .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let (name, data) = read_entry(&mut archive, 0);
        assert_eq!(name, "caja-1.png");
        assert_eq!(data, b"first");
        let (name, data) = read_entry(&mut archive, 1);
        assert_eq!(name, "caja-2.png");
        assert_eq!(data, b"second");
    }

    #[test]
    fn empty_input_makes_an_empty_archive() {
        let bytes = create_zip(&[]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
