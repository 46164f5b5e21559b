//! Archive entry access over a fully-buffered input byte stream.
//!
//! The input storage contract (§6) only guarantees a streamed byte reader,
//! but `zip`'s reader needs `Seek`; granule archives are staged one at a
//! time and bounded by `BuildConfig::worker_threads` concurrency, so
//! buffering the whole archive into memory before indexing it is the same
//! tradeoff the teacher's `Ingester` makes (`ingest_bytes` takes an owned
//! `Bytes` buffer rather than streaming incrementally).

use std::io::{Cursor, Read};

use crate::error::StagingError;

/// Random access over a named-entry archive (zip or tar), independent of the
/// concrete container format.
pub trait ArchiveReader {
    /// Every entry name present, in archive order.
    fn entry_names(&self) -> Vec<String>;

    /// Read one entry's full contents by name.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StagingError>;
}

pub struct ZipArchiveReader {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl ZipArchiveReader {
    pub fn open(bytes: Vec<u8>) -> Result<Self, StagingError> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| StagingError::Archive(e.to_string()))?;
        Ok(Self { archive })
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(|s| s.to_string()).collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StagingError> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|e| StagingError::Archive(format!("entry '{name}' not found: {e}")))?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)
            .map_err(StagingError::Open)?;
        Ok(buf)
    }
}

/// Tar archive, optionally gzip-compressed (sniffed from the gzip magic
/// bytes rather than the URI extension, since the storage layer only hands
/// us bytes).
pub struct TarArchiveReader {
    entries: Vec<(String, Vec<u8>)>,
}

impl TarArchiveReader {
    pub fn open(bytes: Vec<u8>) -> Result<Self, StagingError> {
        let is_gzip = bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b;
        let reader: Box<dyn Read> = if is_gzip {
            Box::new(flate2::read::GzDecoder::new(Cursor::new(bytes)))
        } else {
            Box::new(Cursor::new(bytes))
        };

        let mut archive = tar::Archive::new(reader);
        let mut entries = Vec::new();
        for entry in archive
            .entries()
            .map_err(|e| StagingError::Archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| StagingError::Archive(e.to_string()))?;
            let path = entry
                .path()
                .map_err(|e| StagingError::Archive(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).map_err(StagingError::Open)?;
            entries.push((path, buf));
        }
        Ok(Self { entries })
    }
}

impl ArchiveReader for TarArchiveReader {
    fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StagingError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StagingError::Archive(format!("entry '{name}' not found")))
    }
}

/// Open an archive from its buffered bytes, sniffing the container format
/// from its magic bytes (zip: `PK\x03\x04`; everything else is handed to the
/// tar reader, which itself sniffs gzip).
pub fn open_archive(bytes: Vec<u8>) -> Result<Box<dyn ArchiveReader>, StagingError> {
    if bytes.len() >= 4 && &bytes[0..4] == b"PK\x03\x04" {
        Ok(Box::new(ZipArchiveReader::open(bytes)?))
    } else {
        Ok(Box::new(TarArchiveReader::open(bytes)?))
    }
}
