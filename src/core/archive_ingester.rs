/*
 * Turns the raw bytes of a zip archive into the sorted list of `RepoFile`s that
 * makes up a session snapshot.
 *
 * Entries are read sequentially from the archive (the zip reader needs `&mut`),
 * then decoded as UTF-8 on the rayon pool, and joined back before the final sort
 * so that the output order is deterministic regardless of scheduling.
 */
use crate::core::path_classifier;
use crate::core::repo_file::RepoFile;
use rayon::prelude::*;
use std::io::{self, Cursor, Read};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestOptions {
    /* Keep binary entries in the snapshot (unselected, without content). */
    pub include_binary_entries: bool,
    /* Glob patterns matched against the normalized path; matches are skipped. */
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug)]
pub enum IngestError {
    MalformedArchive(zip::result::ZipError),
    InvalidExcludePattern(String, glob::PatternError),
    Io(io::Error),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::MalformedArchive(e) => write!(f, "Failed to read zip archive: {e}"),
            IngestError::InvalidExcludePattern(pattern, e) => {
                write!(f, "Invalid exclude pattern '{pattern}': {e}")
            }
            IngestError::Io(e) => write!(f, "I/O error while reading archive: {e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::MalformedArchive(e) => Some(e),
            IngestError::InvalidExcludePattern(_, e) => Some(e),
            IngestError::Io(e) => Some(e),
        }
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::MalformedArchive(err)
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

/*
 * Defines the operations for turning archive bytes into repository files.
 * `progress` is called with (processed, total) once per non-directory entry.
 */
pub trait ArchiveIngesterOperations: Send + Sync {
    fn ingest(
        &self,
        bytes: &[u8],
        options: &IngestOptions,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<RepoFile>>;
}

pub struct CoreZipIngester {}

impl CoreZipIngester {
    pub fn new() -> Self {
        CoreZipIngester {}
    }
}

impl Default for CoreZipIngester {
    fn default() -> Self {
        Self::new()
    }
}

/*
 * Returns the single top-level folder (with its trailing slash) shared by every
 * path, if there is one. A lone file at the top level means there is no prefix.
 */
fn common_root_prefix(paths: &[String]) -> Option<String> {
    let first = paths.first()?;
    let (segment, _) = first.split_once('/')?;
    let prefix = format!("{segment}/");
    if paths.iter().all(|p| p.starts_with(&prefix) && p.len() > prefix.len()) {
        Some(prefix)
    } else {
        None
    }
}

fn compile_excludes(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| IngestError::InvalidExcludePattern(p.clone(), e))
        })
        .collect()
}

enum RawEntry {
    Text { path: String, bytes: Vec<u8> },
    Binary { path: String, size: usize },
}

impl ArchiveIngesterOperations for CoreZipIngester {
    fn ingest(
        &self,
        bytes: &[u8],
        options: &IngestOptions,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<RepoFile>> {
        let excludes = compile_excludes(&options.exclude_patterns)?;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        log::debug!("ZipIngester: Archive has {} entries.", archive.len());

        // First pass: names of all file entries, needed for the root prefix.
        let mut file_entries: Vec<(usize, String)> = Vec::new();
        for index in 0..archive.len() {
            match archive.by_index_raw(index) {
                Ok(entry) if entry.is_dir() => {}
                Ok(entry) => file_entries.push((index, entry.name().replace('\\', "/"))),
                Err(e) => log::warn!("ZipIngester: Skipping unreadable entry #{index}: {e}"),
            }
        }
        let names: Vec<String> = file_entries.iter().map(|(_, n)| n.clone()).collect();
        let root_prefix = common_root_prefix(&names);
        if let Some(prefix) = &root_prefix {
            log::debug!("ZipIngester: Stripping common root prefix '{prefix}'.");
        }

        // Second pass: filter and read raw bytes sequentially.
        let total = file_entries.len();
        let mut raw_entries: Vec<RawEntry> = Vec::new();
        for (processed, (index, name)) in file_entries.into_iter().enumerate() {
            progress(processed + 1, total);

            let path = match &root_prefix {
                Some(prefix) => name[prefix.len()..].to_string(),
                None => name,
            };
            if path.is_empty() || path_classifier::is_hidden_path(&path) {
                continue;
            }
            if excludes.iter().any(|pattern| pattern.matches(&path)) {
                log::trace!("ZipIngester: '{path}' matches an exclude pattern.");
                continue;
            }

            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("ZipIngester: Skipping '{path}', cannot open entry: {e}");
                    continue;
                }
            };

            if path_classifier::is_binary_file(&path) {
                if options.include_binary_entries {
                    raw_entries.push(RawEntry::Binary {
                        size: entry.size() as usize,
                        path,
                    });
                }
                continue;
            }

            let mut buffer = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut buffer) {
                log::warn!("ZipIngester: Skipping '{path}', failed to read entry: {e}");
                continue;
            }
            raw_entries.push(RawEntry::Text {
                path,
                bytes: buffer,
            });
        }

        let mut files: Vec<RepoFile> = raw_entries
            .into_par_iter()
            .filter_map(|raw| match raw {
                RawEntry::Binary { path, size } => Some(RepoFile::new_binary_placeholder(path, size)),
                RawEntry::Text { path, bytes } => match String::from_utf8(bytes) {
                    Ok(content) => Some(RepoFile::new_text(path, content)),
                    Err(e) => {
                        log::warn!("ZipIngester: Skipping '{path}', not valid UTF-8: {e}");
                        None
                    }
                },
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        let before = files.len();
        files.dedup_by(|later, earlier| later.path == earlier.path);
        if files.len() != before {
            log::warn!(
                "ZipIngester: Dropped {} duplicate path(s).",
                before - files.len()
            );
        }

        log::info!(
            "ZipIngester: Ingested {} files from {} entries.",
            files.len(),
            total
        );
        Ok(files)
    }
}
