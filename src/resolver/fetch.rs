//! Transferring located archives into the external-modules directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resolver::errors::FetchError;
use crate::resolver::locator::{Expected, Location};
use crate::util::hash::sha256_bytes;

/// Copies the resource behind a location to a destination file.
///
/// A destination must only appear once the transfer is complete and
/// verified.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, location: &Location, destination: &Path) -> Result<(), FetchError>;
}

/// Fetches `http(s)` and `file` URIs as well as plain local paths.
///
/// One client is created per run and shared by all concurrent fetches.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("modweave/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Transfer {
            uri: String::new(),
            message: e.to_string(),
        })?;
        Ok(HttpFetcher { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        HttpFetcher { client }
    }

    fn download(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let transfer = |e: reqwest::Error| FetchError::Transfer {
            uri: uri.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(uri)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(transfer)?;
        Ok(response.bytes().map_err(transfer)?.to_vec())
    }
}

/// Local file behind a `file:` URI or a plain path, if `uri` is one.
fn local_path(uri: &str) -> Option<PathBuf> {
    match url::Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        // Single letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => None,
        _ => Some(PathBuf::from(uri)),
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &Location, destination: &Path) -> Result<(), FetchError> {
        let uri = location.target();
        let bytes = match local_path(uri) {
            Some(path) => std::fs::read(&path).map_err(|source| FetchError::Io { path, source })?,
            None => self.download(uri)?,
        };
        verify(uri, &bytes, &location.expected())?;
        write_atomically(destination, &bytes)
    }
}

/// Check size and checksum expectations.
pub fn verify(uri: &str, bytes: &[u8], expected: &Expected) -> Result<(), FetchError> {
    if let Some(size) = expected.size {
        if bytes.len() as u64 != size {
            return Err(FetchError::Size {
                uri: uri.to_string(),
                expected: size,
                actual: bytes.len() as u64,
            });
        }
    }
    if let Some(sha256) = &expected.sha256 {
        let actual = sha256_bytes(bytes);
        if &actual != sha256 {
            return Err(FetchError::Checksum {
                uri: uri.to_string(),
                expected: sha256.clone(),
                actual,
            });
        }
    }
    Ok(())
}

/// Write through a `.part` file in the destination directory, then rename.
pub fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let io = |source| FetchError::Io {
        path: destination.to_path_buf(),
        source,
    };
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io)?;
    let prefix = destination
        .file_name()
        .map(|n| format!("{}.", n.to_string_lossy()))
        .unwrap_or_default();
    let mut part = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(io)?;
    part.write_all(bytes).map_err(io)?;
    part.as_file().sync_all().map_err(io)?;
    part.persist(destination).map_err(|e| io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_local_file_with_checksum() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jar");
        std::fs::write(&source, b"hello").unwrap();
        let destination = tmp.path().join("out/a.jar");

        let location = Location::new(format!(
            "{}#sha256=2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824&size=5",
            source.display()
        ));
        let fetcher = HttpFetcher::new(None).unwrap();
        fetcher.fetch(&location, &destination).unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"hello");
    }

    #[test]
    fn test_checksum_mismatch_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jar");
        std::fs::write(&source, b"hello").unwrap();
        let destination = tmp.path().join("a.jar");

        let location = Location::new(format!("{}#sha256=00", source.display()));
        let err = HttpFetcher::new(None).unwrap().fetch(&location, &destination).unwrap_err();
        assert!(matches!(err, FetchError::Checksum { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_size_mismatch() {
        let err = verify(
            "x",
            b"abc",
            &Expected {
                sha256: None,
                size: Some(4),
            },
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Size { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_local_path_detection() {
        assert_eq!(local_path("/opt/a.jar"), Some(PathBuf::from("/opt/a.jar")));
        assert_eq!(local_path("lib/a.jar"), Some(PathBuf::from("lib/a.jar")));
        assert_eq!(local_path("file:///opt/a.jar"), Some(PathBuf::from("/opt/a.jar")));
        assert_eq!(local_path("https://host/a.jar"), None);
    }

    #[test]
    fn test_write_atomically_replaces_existing() {
        let tmp = TempDir::new().unwrap();
        let destination = tmp.path().join("a.jar");
        std::fs::write(&destination, b"old").unwrap();
        write_atomically(&destination, b"new").unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
