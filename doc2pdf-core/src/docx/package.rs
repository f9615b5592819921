//! Zip container access
//!
//! Entries are held decompressed in archive order and written back in the
//! same order with their original compression method and timestamp.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use super::DocxError;

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    modified: Option<DateTime>,
    is_dir: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    /// Read every entry, failing once the decompressed total passes
    /// `max_unpacked` bytes.
    pub(crate) fn read(bytes: &[u8], max_unpacked: u64) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        let mut remaining = max_unpacked;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            // Declared sizes are untrusted
            let mut data = Vec::with_capacity(file.size().min(remaining).min(1 << 20) as usize);
            let limit = remaining.saturating_add(1);
            let read = (&mut file).take(limit).read_to_end(&mut data)? as u64;
            if read > remaining {
                tracing::warn!(
                    "Entry '{}' pushes the unpacked package past {max_unpacked} bytes",
                    file.name()
                );
                return Err(DocxError::TooLarge {
                    limit: max_unpacked,
                });
            }
            remaining -= read;

            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                modified: file.last_modified(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| !entry.is_dir && entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// Write the package, substituting the content of entries named in
    /// `overrides`.
    pub(crate) fn write(&self, overrides: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let mut options = SimpleFileOptions::default().compression_method(method);
            if let Some(modified) = entry.modified {
                options = options.last_modified_time(modified);
            }

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                let data = overrides.get(&entry.name).unwrap_or(&entry.data);
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(data)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}
