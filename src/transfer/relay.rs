use crate::error::{RelayError, Result};
use crate::transfer::RemoteStore;
use crate::utils::{dated_file_name, remote_path, sha256_hex, TEXT_EXTENSION};
use std::io::{Cursor, Read};
use tracing::{debug, info};
use zip::ZipArchive;

/// Upper bound on the buffer reserved from a member's declared size
const SIZE_HINT_LIMIT: u64 = 8 * 1024 * 1024;

/// Extract every `.txt` member of `archive` and write it to
/// `{base_path}/{stem}-{date}.txt` on `store`
///
/// Members are processed in archive order. The first read or write failure
/// aborts the relay; files already written stay on the server.
pub fn relay_archive<S: RemoteStore + ?Sized>(
    archive: &[u8],
    store: &mut S,
    base_path: &str,
    date: &str,
) -> Result<RelayReport> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut report = RelayReport::empty();

    info!("Archive contains {} member(s)", zip.len());

    for index in 0..zip.len() {
        let mut member = zip.by_index(index)?;
        let name = member.name().to_string();

        let Some(new_name) = dated_file_name(&name, TEXT_EXTENSION, date) else {
            debug!("Skipping {}", name);
            report.skipped.push(name);
            continue;
        };

        info!("Extracting and uploading {}...", name);

        let mut content = Vec::with_capacity(capacity_hint(member.size()));
        member
            .read_to_end(&mut content)
            .map_err(|source| RelayError::ArchiveMember {
                name: name.clone(),
                source,
            })?;

        let destination = remote_path(base_path, &new_name);
        store.write_file(&destination, &content)?;

        info!("Uploaded {} as {}", name, destination);
        report.uploaded.push(UploadedFile {
            sha256: sha256_hex(&content),
            size_bytes: content.len() as u64,
            source_name: name,
            remote_path: destination,
        });
    }

    Ok(report)
}

/// Initial buffer size for a member; the header's size is not trusted
fn capacity_hint(declared_size: u64) -> usize {
    declared_size.min(SIZE_HINT_LIMIT) as usize
}

/// Report structure for one relay run
#[derive(Debug, Clone, Default)]
pub struct RelayReport {
    pub uploaded: Vec<UploadedFile>,
    pub skipped: Vec<String>,
}

impl RelayReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total_processed(&self) -> usize {
        self.uploaded.len() + self.skipped.len()
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded.iter().map(|file| file.size_bytes).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub source_name: String,
    pub remote_path: String,
    pub size_bytes: u64,
    pub sha256: String,
}
