//! Archive traversal and table loading.
//!
//! A dataset archive is a ZIP whose top-level directories are year
//! partitions. Each partition holds one HTML table per dataset, named
//! `I<token>.xls` and encoded as Windows-1250. [`load`] reads the table of
//! every partition and concatenates them into one [`RawTable`].

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crash_core::error::{CrashError, Result};
use crash_core::models::{DedupPrecedence, RawTable};
use encoding_rs::WINDOWS_1250;
use rayon::prelude::*;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::html::parse_first_table;

/// Prefix the publisher puts in front of every dataset file name.
pub const DATASET_FILE_PREFIX: &str = "I";
/// Extension of the dataset files. The content is HTML despite the name.
pub const DATASET_FILE_EXTENSION: &str = ".xls";

/// Bytes without a character in the Windows-1250 code page.
const UNASSIGNED_WINDOWS_1250: [u8; 5] = [0x81, 0x83, 0x88, 0x90, 0x98];

/// Raw bytes of one partition's dataset file.
struct PartitionBytes {
    partition: String,
    entry: String,
    bytes: Vec<u8>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load dataset `token` from every year partition of `archive_path`.
///
/// Partitions are concatenated in ascending order, which makes the earliest
/// year authoritative during deduplication.
pub fn load(archive_path: &Path, token: &str) -> Result<RawTable> {
    load_with_precedence(archive_path, token, DedupPrecedence::default())
}

/// Like [`load`], concatenating partitions in the processing order of
/// `precedence`.
///
/// Fails with [`CrashError::MissingPartition`] when a partition lacks the
/// dataset file and with [`CrashError::Decode`] on bytes that are not
/// Windows-1250. There is no partial result.
pub fn load_with_precedence(
    archive_path: &Path,
    token: &str,
    precedence: DedupPrecedence,
) -> Result<RawTable> {
    if token.trim().is_empty() {
        return Err(CrashError::Config("dataset token must not be empty".into()));
    }

    let file = File::open(archive_path).map_err(|source| CrashError::FileRead {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(|source| CrashError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut partitions = find_partitions(&archive);
    partitions.sort_by(|a, b| precedence.compare(a, b));
    debug!(?partitions, %precedence, "archive partitions");

    // Zip entries need `&mut` access, so bytes are read sequentially.
    let mut entries = Vec::with_capacity(partitions.len());
    for partition in partitions {
        entries.push(read_partition(&mut archive, archive_path, partition, token)?);
    }

    // Decoding and parsing are independent per partition. Collecting an
    // indexed parallel iterator keeps the partition order.
    let tables: Vec<(String, RawTable)> = entries
        .into_par_iter()
        .map(|entry| -> Result<(String, RawTable)> {
            Ok((entry.partition.clone(), parse_partition(&entry)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let partition_count = tables.len();
    let table =
        RawTable::concat(tables.into_iter().map(|(_, t)| t)).without_placeholder_columns();

    info!(
        "Loaded {} rows with {} columns from {} partitions of {} ({})",
        table.len(),
        table.headers.len(),
        partition_count,
        archive_path.display(),
        token
    );

    Ok(table)
}

/// Names of the top-level directories of `archive`, sorted ascending.
///
/// Both explicit directory entries and directories implied by file paths
/// count. macOS resource-fork folders are skipped.
pub fn find_partitions<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let partitions: BTreeSet<String> = archive
        .file_names()
        .filter_map(|name| name.split_once('/'))
        .map(|(top, _)| top)
        .filter(|top| !top.is_empty() && *top != "__MACOSX")
        .map(str::to_string)
        .collect();
    partitions.into_iter().collect()
}

/// Archive path of dataset `token` inside `partition`.
pub fn entry_name(partition: &str, token: &str) -> String {
    format!("{partition}/{DATASET_FILE_PREFIX}{token}{DATASET_FILE_EXTENSION}")
}

/// Decode Windows-1250 bytes, rejecting bytes the code page leaves
/// unassigned.
pub fn decode_windows_1250(entry: &str, bytes: &[u8]) -> Result<String> {
    if let Some(offset) = bytes
        .iter()
        .position(|b| UNASSIGNED_WINDOWS_1250.contains(b))
    {
        return Err(CrashError::Decode {
            entry: entry.to_string(),
            offset,
            byte: bytes[offset],
        });
    }
    // Every remaining byte value maps to a character.
    let (text, _) = WINDOWS_1250.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_partition<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    archive_path: &Path,
    partition: String,
    token: &str,
) -> Result<PartitionBytes> {
    let entry = entry_name(&partition, token);

    let mut file = match archive.by_name(&entry) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => {
            return Err(CrashError::MissingPartition { partition, entry });
        }
        Err(source) => {
            return Err(CrashError::Archive {
                path: archive_path.to_path_buf(),
                source,
            });
        }
    };

    let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut bytes)
        .map_err(|source| CrashError::FileRead {
            path: archive_path.join(&entry),
            source,
        })?;

    debug!("Read {} bytes from {}", bytes.len(), entry);

    Ok(PartitionBytes {
        partition,
        entry,
        bytes,
    })
}

fn parse_partition(entry: &PartitionBytes) -> Result<RawTable> {
    let text = decode_windows_1250(&entry.entry, &entry.bytes)?;
    let html = parse_first_table(&text).ok_or_else(|| CrashError::NoTable {
        entry: entry.entry.clone(),
    })?;

    let mut table = RawTable::new(html.headers);
    for cells in html.rows {
        table.push_row(entry.partition.as_str(), cells);
    }

    debug!(
        partition = %entry.partition,
        rows = table.len(),
        "parsed partition table"
    );
    Ok(table)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
