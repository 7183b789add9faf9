use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const DOWNLOAD_CHUNK: usize = 1024 * 1024;

/// Locates model files: cache directory first, then an optional bundled
/// directory, finally downloading into the cache.
pub struct ModelResolver {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
}

impl ModelResolver {
    /// Resolver rooted at the platform cache directory.
    pub fn new() -> Result<Self, ModelResolveError> {
        Ok(Self::with_cache_dir(model_cache_dir()?))
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            bundled_dir: None,
        }
    }

    pub fn with_bundled_dir(mut self, dir: PathBuf) -> Self {
        self.bundled_dir = Some(dir);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn resolve(
        &self,
        name: &str,
        url: &str,
        progress: Option<ProgressFn>,
    ) -> Result<PathBuf, ModelResolveError> {
        let cached_path = self.cache_dir.join(name);
        if cached_path.exists() {
            log::debug!("Using cached model {}", cached_path.display());
            return Ok(cached_path);
        }

        if let Some(bundled_path) = self
            .bundled_dir
            .as_ref()
            .map(|dir| dir.join(name))
            .filter(|p| p.exists())
        {
            log::debug!("Using bundled model {}", bundled_path.display());
            return Ok(bundled_path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(ModelResolveError::CacheDir)?;
        log::info!("Downloading {name} from {url}");
        download(url, &cached_path, progress)?;
        Ok(cached_path)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceScan/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceScan/models/` or `~/.cache/FaceScan/models/`
/// - Windows: `%LOCALAPPDATA%/FaceScan/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("FaceScan").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `dest` via a `.part` file renamed on success.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = download_to(url, &temp_path, progress).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|source| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_to(
    url: &str,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |source: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(write_err)?;
    let mut buf = vec![0u8; DOWNLOAD_CHUNK];

    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNREACHABLE: &str = "http://invalid.nonexistent.example.com/model.onnx";

    #[test]
    fn test_resolve_returns_cached_file_without_download() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join("model.onnx");
        fs::write(&cached, b"cached").unwrap();

        let resolver = ModelResolver::with_cache_dir(tmp.path().to_path_buf());
        let path = resolver.resolve("model.onnx", UNREACHABLE, None).unwrap();
        assert_eq!(path, cached);
    }

    #[test]
    fn test_resolve_falls_back_to_bundled_dir() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("model.onnx"), b"bundled").unwrap();

        let resolver = ModelResolver::with_cache_dir(tmp.path().join("cache"))
            .with_bundled_dir(bundled.clone());
        let path = resolver.resolve("model.onnx", UNREACHABLE, None).unwrap();
        assert_eq!(path, bundled.join("model.onnx"));
    }

    #[test]
    fn test_resolve_download_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let resolver = ModelResolver::with_cache_dir(tmp.path().to_path_buf());

        let result = resolver.resolve("model.onnx", UNREACHABLE, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!tmp.path().join("model.onnx").exists());
        assert!(!tmp.path().join("model.part").exists());
    }

    #[test]
    fn test_model_cache_dir_is_namespaced() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with(Path::new("FaceScan").join("models")));
    }
}
