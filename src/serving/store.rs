//! Object storage collaborators used to fetch the model artifact.

use reqwest::Url;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default public endpoint of Google Cloud Storage.
pub const GCS_DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Error raised while fetching an object.
#[derive(Debug)]
pub enum StoreError {
    /// The object does not exist.
    NotFound(String),
    /// The store answered with an unexpected HTTP status.
    Status { code: u16, object: String },
    /// Transport-level HTTP failure.
    Http(String),
    /// Endpoint, bucket or key cannot form a valid location.
    InvalidLocation(String),
    /// Local filesystem failure.
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(object) => write!(f, "Object {} not found", object),
            StoreError::Status { code, object } => {
                write!(f, "Fetching {} returned HTTP {}", object, code)
            }
            StoreError::Http(msg) => write!(f, "HTTP error: {}", msg),
            StoreError::InvalidLocation(msg) => write!(f, "Invalid object location: {}", msg),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(err.to_string())
    }
}

/// A blob store that can copy one object to a local file.
pub trait ObjectStore: Send + Sync {
    /// Download `bucket/key` to `dest`, creating parent directories.
    ///
    /// `dest` is either left untouched or fully written.
    fn fetch_to_path(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StoreError>;
}

/// Sibling path the download is staged in before the final rename.
fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write through `write` into the staging file, then rename it over `dest`.
/// The staging file is removed when any step fails.
fn stage_and_commit<F>(dest: &Path, write: F) -> Result<u64, StoreError>
where
    F: FnOnce(&Path) -> Result<u64, StoreError>,
{
    ensure_parent(dest)?;
    let part = staging_path(dest);
    let result = write(&part).and_then(|n| {
        fs::rename(&part, dest)?;
        Ok(n)
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn ensure_parent(dest: &Path) -> io::Result<()> {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Google Cloud Storage over its JSON API.
#[derive(Clone, Debug)]
pub struct GcsObjectStore {
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for GcsObjectStore {
    fn default() -> Self {
        Self::new(GCS_DEFAULT_ENDPOINT)
    }
}

impl GcsObjectStore {
    /// Store talking to `endpoint`, such as a local emulator.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: None,
            timeout: Duration::from_secs(300),
        }
    }

    /// Send `Authorization: Bearer <token>` with each request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{endpoint}/storage/v1/b/{bucket}/o/{key}?alt=media`, with the key
    /// percent-encoded as one path segment.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| StoreError::InvalidLocation(format!("{}: {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidLocation(self.endpoint.clone()))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", key]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }
}

impl ObjectStore for GcsObjectStore {
    fn fetch_to_path(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StoreError> {
        let url = self.object_url(bucket, key)?;
        let object = format!("gs://{}/{}", bucket, key);
        tracing::info!(%object, dest = %dest.display(), "downloading model artifact");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let mut request = client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let mut response = request.send()?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(object));
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                object,
            });
        }

        let written = stage_and_commit(dest, |part| {
            let mut file = File::create(part)?;
            let n = response.copy_to(&mut file)?;
            file.sync_all()?;
            Ok(n)
        })?;

        tracing::info!(%object, bytes = written, "model artifact downloaded");
        Ok(())
    }
}

/// A local directory laid out as `<root>/<bucket>/<key>`.
#[derive(Clone, Debug)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn fetch_to_path(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StoreError> {
        let source = self.root.join(bucket).join(key);
        if !source.is_file() {
            return Err(StoreError::NotFound(source.display().to_string()));
        }

        stage_and_commit(dest, |part| Ok(fs::copy(&source, part)?))?;
        tracing::debug!(source = %source.display(), dest = %dest.display(), "copied object");
        Ok(())
    }
}
