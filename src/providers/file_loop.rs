//! Generic file-provider refresh loop (§4.8), shared by every
//! `file_*` provider type. A provider is the triple (secret source, optional
//! post-processing, output path); this module owns the loop, the mutex, and
//! the one-shot `refresh()` entry point so concrete providers only supply
//! the source.

use async_trait::async_trait;
use std::os::unix::fs::OpenOptionsExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::providers::{FileProvider, SecretFetcher};
use crate::template;
use crate::transform::{self, TransformConfig};

const FILE_MODE: u32 = 0o600;

/// What happens to the raw fetched secret before it is written to disk.
/// Template and transform are mutually exclusive per §4.2 — enforced at
/// config load time, not here.
pub enum PostProcess {
    None,
    Template(String),
    Transform(TransformConfig),
}

impl PostProcess {
    fn apply(&self, raw: &str) -> String {
        match self {
            PostProcess::None => raw.to_string(),
            PostProcess::Template(t) => template::substitute(t, raw),
            PostProcess::Transform(c) => transform::apply(raw, c),
        }
    }
}

pub struct FileRefreshLoop {
    file_name: String,
    refresh_interval: Duration,
    source: Box<dyn SecretFetcher>,
    post_process: PostProcess,
    write_lock: AsyncMutex<()>,
    cancellation: CancellationToken,
}

impl FileRefreshLoop {
    pub fn new(
        file_name: String,
        refresh_interval: Duration,
        source: Box<dyn SecretFetcher>,
        post_process: PostProcess,
    ) -> Self {
        Self {
            file_name,
            refresh_interval,
            source,
            post_process,
            write_lock: AsyncMutex::new(()),
            cancellation: CancellationToken::new(),
        }
    }

    /// A clone of the cancellation token, for an owner that wants to stop
    /// the loop started by [`FileProvider::start`] (§5, §9 "no graceful
    /// shutdown" — the token is a seam, nothing calls `cancel()` yet).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    fn create_truncated(&self) -> Result<(), ProviderError> {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(&self.file_name)
            .map(|_| ())
            .map_err(|e| ProviderError::WriteFailed {
                path: self.file_name.clone(),
                source: e,
            })
    }

    async fn fetch_and_write(&self) -> Result<(), ProviderError> {
        let raw = self.source.fetch_secret().await?;
        let rendered = self.post_process.apply(&raw);

        let _guard = self.write_lock.lock().await;
        std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .mode(FILE_MODE)
            .open(&self.file_name)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(rendered.as_bytes())
            })
            .map_err(|e| ProviderError::WriteFailed {
                path: self.file_name.clone(),
                source: e,
            })
    }
}

#[async_trait]
impl FileProvider for FileRefreshLoop {
    async fn start(self: Arc<Self>) {
        if let Err(e) = self.create_truncated() {
            tracing::error!(file = %self.file_name, error = %e, "failed to create output file");
        }

        loop {
            if self.cancellation.is_cancelled() {
                return;
            }
            if let Err(e) = self.fetch_and_write().await {
                tracing::error!(file = %self.file_name, error = %e, code = e.error_code(), "refresh loop iteration failed, continuing");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.refresh_interval) => {}
                _ = self.cancellation.cancelled() => return,
            }
        }
    }

    async fn refresh(&self) -> Result<(), ProviderError> {
        self.fetch_and_write().await
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError as PErr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    struct ScriptedSource {
        calls: AtomicUsize,
        values: Vec<&'static str>,
    }

    #[async_trait]
    impl SecretFetcher for ScriptedSource {
        async fn fetch_secret(&self) -> Result<String, PErr> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.values[i.min(self.values.len() - 1)].to_string())
        }
    }

    #[tokio::test]
    async fn refresh_writes_exact_bytes_with_no_post_processing() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let source = Box::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            values: vec!["secret-v1"],
        });
        let provider = FileRefreshLoop::new(path.clone(), Duration::from_secs(60), source, PostProcess::None);
        provider.refresh().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret-v1");
    }

    #[tokio::test]
    async fn second_refresh_overwrites_with_new_value() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let source = Box::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            values: vec!["secret-v1", "secret-v2"],
        });
        let provider = FileRefreshLoop::new(path.clone(), Duration::from_secs(60), source, PostProcess::None);
        provider.refresh().await.unwrap();
        provider.refresh().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret-v2");
    }

    #[tokio::test]
    async fn file_is_created_with_mode_0600() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").to_str().unwrap().to_string();
        let source = Box::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            values: vec!["v"],
        });
        let provider = Arc::new(FileRefreshLoop::new(path.clone(), Duration::from_secs(3600), source, PostProcess::None));
        provider.create_truncated().unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        use std::os::unix::fs::PermissionsExt;
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn transform_post_processing_is_applied_before_write() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let source = Box::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            values: vec![r#"{"username":"admin","password":"p"}"#],
        });
        let config = TransformConfig {
            mode: crate::transform::TransformMode::TransformedOnly,
            key_mappings: vec![crate::transform::KeyMapping {
                from: "username".to_string(),
                to: "user".to_string(),
            }],
        };
        let provider = FileRefreshLoop::new(path.clone(), Duration::from_secs(60), source, PostProcess::Transform(config));
        provider.refresh().await.unwrap();
        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["user"], "admin");
        assert!(written.get("password").is_none());
    }
}
