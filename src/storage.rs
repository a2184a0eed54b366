//! Audio storage for HNTLDR.
//!
//! Episode audio lives in a flat local directory keyed by file name. Clients
//! never get a bare path; they get a URL signed with the server secret that
//! stops working after `url_ttl`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

use crate::{HntldrError, Result};

/// Default lifetime of a signed URL (1 hour).
pub const DEFAULT_URL_TTL_SECS: u64 = 3600;

/// Maximum length of a storage key.
const MAX_KEY_LENGTH: usize = 128;

/// Local audio object store with signed URLs.
#[derive(Debug, Clone)]
pub struct AudioStorage {
    base_path: PathBuf,
    secret: String,
    url_ttl: Duration,
}

impl AudioStorage {
    /// Create a storage rooted at `base_path`, creating the directory if needed.
    pub fn new(
        base_path: impl Into<PathBuf>,
        secret: impl Into<String>,
        url_ttl_secs: u64,
    ) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            secret: secret.into(),
            url_ttl: Duration::seconds(url_ttl_secs.min(i64::MAX as u64) as i64),
        })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check that a key is a plain file name.
    ///
    /// Keys are limited to ASCII letters, digits, `.`, `_` and `-`, and may not
    /// start with a dot.
    pub fn validate_key(key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && key.len() <= MAX_KEY_LENGTH
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if valid {
            Ok(())
        } else {
            Err(HntldrError::Validation(format!("invalid audio key: {key}")))
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// Store an object, replacing any previous content.
    pub async fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::write(&path, content)
            .await
            .map_err(|e| HntldrError::Storage(format!("failed to write {key}: {e}")))?;
        debug!("Stored {} bytes at {:?}", content.len(), path);
        Ok(())
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Load an object's bytes.
    pub async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(HntldrError::NotFound(format!("audio {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object. Returns `false` if it did not exist.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Hex SHA-256 over `secret ‖ key ‖ expires`.
    fn signature(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update(expires.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Build a time-limited URL for `key` under `base_url`.
    pub fn signed_url(&self, base_url: &str, key: &str, now: DateTime<Utc>) -> Result<String> {
        Self::validate_key(key)?;
        let expires = (now + self.url_ttl).timestamp();
        Ok(format!(
            "{}/media/{}?expires={}&signature={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(key),
            expires,
            self.signature(key, expires)
        ))
    }

    /// Check a signature produced by [`AudioStorage::signed_url`].
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if Self::validate_key(key).is_err() || now.timestamp() >= expires {
            return false;
        }
        constant_time_eq(self.signature(key, expires).as_bytes(), signature.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn storage() -> (TempDir, AudioStorage) {
        let dir = TempDir::new().unwrap();
        let storage = AudioStorage::new(dir.path().join("audio"), "s3cret", 3600).unwrap();
        (dir, storage)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
            .unwrap()
    }

    #[test]
    fn test_validate_key() {
        assert!(AudioStorage::validate_key("hntldr-daily-20250301.mp3").is_ok());
        assert!(AudioStorage::validate_key("a_b.c").is_ok());
        assert!(AudioStorage::validate_key("").is_err());
        assert!(AudioStorage::validate_key(".hidden").is_err());
        assert!(AudioStorage::validate_key("../etc/passwd").is_err());
        assert!(AudioStorage::validate_key("a/b.mp3").is_err());
        assert!(AudioStorage::validate_key("a b.mp3").is_err());
        assert!(AudioStorage::validate_key(&"a".repeat(200)).is_err());
    }

    #[tokio::test]
    async fn test_put_exists_load() {
        let (_dir, storage) = storage();
        assert!(!storage.exists("ep.mp3").await.unwrap());

        storage.put("ep.mp3", b"ID3audio").await.unwrap();
        assert!(storage.exists("ep.mp3").await.unwrap());
        assert_eq!(storage.load("ep.mp3").await.unwrap(), b"ID3audio");

        assert!(storage.delete("ep.mp3").await.unwrap());
        assert!(!storage.delete("ep.mp3").await.unwrap());
        assert!(!storage.exists("ep.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn test_load_missing() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.load("missing.mp3").await,
            Err(HntldrError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_put_rejects_bad_key() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.put("../x.mp3", b"x").await,
            Err(HntldrError::Validation(_))
        ));
    }

    #[test]
    fn test_signed_url_verifies() {
        let (_dir, storage) = storage();
        let url = storage
            .signed_url("http://localhost:8080/", "ep.mp3", now())
            .unwrap();
        assert!(url.starts_with("http://localhost:8080/media/ep.mp3?expires="));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");
        assert_eq!(expires, now().timestamp() + 3600);
        assert_eq!(signature.len(), 64);

        assert!(storage.verify("ep.mp3", expires, signature, now()));
        assert!(storage.verify(
            "ep.mp3",
            expires,
            signature,
            now() + Duration::minutes(59)
        ));
    }

    #[test]
    fn test_signature_expires() {
        let (_dir, storage) = storage();
        let url = storage.signed_url("", "ep.mp3", now()).unwrap();
        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");

        assert!(!storage.verify("ep.mp3", expires, signature, now() + Duration::hours(1)));
    }

    #[test]
    fn test_signature_bound_to_key_and_expiry() {
        let (_dir, storage) = storage();
        let url = storage.signed_url("", "ep.mp3", now()).unwrap();
        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");

        assert!(!storage.verify("other.mp3", expires, signature, now()));
        assert!(!storage.verify("ep.mp3", expires + 60, signature, now()));
        assert!(!storage.verify("ep.mp3", expires, "deadbeef", now()));
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let dir = TempDir::new().unwrap();
        let a = AudioStorage::new(dir.path(), "one", 3600).unwrap();
        let b = AudioStorage::new(dir.path(), "two", 3600).unwrap();
        let url = a.signed_url("", "ep.mp3", now()).unwrap();
        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");

        assert!(!b.verify("ep.mp3", expires, signature, now()));
    }
}
