/*
 * Where archive bytes come from: a repository reference resolved to a downloadable
 * zip URL and fetched over HTTP, or a zip file already on the local disk.
 *
 * The concrete fetcher uses a blocking `reqwest` client without a request timeout;
 * a slow download simply keeps reporting progress until it completes or fails.
 */
use std::io::{self, Read};
use std::path::Path;
use std::time::{Duration, Instant};

const GITHUB_HOST: &str = "github.com";
const DEFAULT_BRANCH: &str = "main";
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
/* Minimum time between two progress reports during a download. */
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum SourceError {
    InvalidReference(String),
    NoFileChosen,
    Http(reqwest::Error),
    HttpStatus(u16),
    Io(io::Error),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::InvalidReference(input) => {
                write!(f, "Invalid GitHub repository URL: '{input}'")
            }
            SourceError::NoFileChosen => write!(f, "No archive file was chosen"),
            SourceError::Http(e) => write!(f, "Network error occurred: {e}"),
            SourceError::HttpStatus(status) => write!(f, "HTTP error! status: {status}"),
            SourceError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Http(e) => Some(e),
            SourceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err)
    }
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        SourceError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/*
 * A parsed GitHub repository reference. Accepted inputs, after trimming a trailing
 * slash and a `.git` suffix on the repository name:
 *   https://github.com/{owner}/{repo}
 *   https://github.com/{owner}/{repo}/tree/{ref}[/{subpath}]
 *   {owner}/{repo}
 * `http://` is accepted as well. The subpath is recorded but the whole archive of
 * the ref is always downloaded.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    pub subpath: Option<String>,
}

fn is_valid_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl RepoReference {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || SourceError::InvalidReference(input.to_string());
        let trimmed = input.trim().trim_end_matches('/');

        let (rest, shorthand) = if let Some(rest) = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
        {
            let rest = rest.strip_prefix("www.").unwrap_or(rest);
            let path = rest
                .strip_prefix(GITHUB_HOST)
                .and_then(|p| p.strip_prefix('/'))
                .ok_or_else(invalid)?;
            (path, false)
        } else if trimmed.contains("://") {
            return Err(invalid());
        } else {
            (trimmed, true)
        };

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() < 2 || (shorthand && segments.len() != 2) {
            return Err(invalid());
        }
        let owner = segments[0];
        let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
        if !is_valid_name_segment(owner) || !is_valid_name_segment(repo) {
            return Err(invalid());
        }

        let (git_ref, subpath) = match segments.len() {
            2 => (DEFAULT_BRANCH.to_string(), None),
            n if n >= 4 && segments[2] == "tree" && !segments[3].is_empty() => {
                let subpath = segments[4..].join("/");
                (
                    segments[3].to_string(),
                    if subpath.is_empty() { None } else { Some(subpath) },
                )
            }
            _ => return Err(invalid()),
        };

        Ok(RepoReference {
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref,
            subpath,
        })
    }

    pub fn archive_url(&self) -> String {
        format!(
            "https://{GITHUB_HOST}/{}/{}/archive/refs/heads/{}.zip",
            self.owner, self.repo, self.git_ref
        )
    }
}

/*
 * Formats a byte count the way file sizes are usually shown: base 1024, at most
 * two decimals, trailing zeros dropped ("1.5 KB", "1 MB", "0 Bytes").
 */
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted} {}", UNITS[unit])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
    pub bytes_per_second: f64,
}

impl DownloadProgress {
    /* Percentage of the download, or None when the server sent no length. */
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => Some(((self.loaded.min(total) * 100) / total) as u8),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        let speed = if self.bytes_per_second > 0.0 {
            format!(" {}/s", format_bytes(self.bytes_per_second as u64))
        } else {
            String::new()
        };
        match self.total {
            Some(total) => format!(
                "Downloading repository: {} of {}{speed}",
                format_bytes(self.loaded),
                format_bytes(total)
            ),
            None => format!(
                "Downloading repository: {} downloaded{speed}",
                format_bytes(self.loaded)
            ),
        }
    }
}

/*
 * Defines the operations for obtaining archive bytes. Kept behind a trait so the
 * application shell can be exercised without network or disk access.
 */
pub trait ArchiveSourceOperations: Send + Sync {
    fn fetch_remote(
        &self,
        url: &str,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<Vec<u8>>;

    fn read_local(&self, path: &Path) -> Result<Vec<u8>>;
}

pub struct CoreArchiveSource {
    client: reqwest::blocking::Client,
}

impl CoreArchiveSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("PromptPacker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(CoreArchiveSource { client })
    }
}

impl ArchiveSourceOperations for CoreArchiveSource {
    fn fetch_remote(
        &self,
        url: &str,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<Vec<u8>> {
        log::info!("ArchiveSource: Downloading {url}");
        let mut response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("ArchiveSource: Download of {url} failed with status {status}");
            return Err(SourceError::HttpStatus(status.as_u16()));
        }

        let total = response.content_length();
        let started = Instant::now();
        let mut last_report: Option<Instant> = None;
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        loop {
            let read = response.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);

            let now = Instant::now();
            if last_report.is_none_or(|t| now.duration_since(t) >= PROGRESS_INTERVAL) {
                last_report = Some(now);
                let elapsed = now.duration_since(started).as_secs_f64();
                progress(DownloadProgress {
                    loaded: bytes.len() as u64,
                    total,
                    bytes_per_second: if elapsed > 0.0 {
                        bytes.len() as f64 / elapsed
                    } else {
                        0.0
                    },
                });
            }
        }

        progress(DownloadProgress {
            loaded: bytes.len() as u64,
            total: total.or(Some(bytes.len() as u64)),
            bytes_per_second: 0.0,
        });
        log::info!(
            "ArchiveSource: Downloaded {} from {url}",
            format_bytes(bytes.len() as u64)
        );
        Ok(bytes)
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>> {
        if path.as_os_str().is_empty() {
            return Err(SourceError::NoFileChosen);
        }
        log::info!("ArchiveSource: Reading local archive {path:?}");
        Ok(std::fs::read(path)?)
    }
}
