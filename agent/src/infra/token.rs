//! Bearer-token interceptor for Device-Manager calls.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Header built from one version of the token file.
#[derive(Debug, Clone)]
struct Cached {
    modified: SystemTime,
    len: u64,
    value: MetadataValue<Ascii>,
}

/// Attaches `authorization: Bearer <jwt>` to every outgoing request.
///
/// Interceptors run synchronously on the executor, so each call only stats
/// the token file; it is read again when its mtime or size changes, which
/// picks up a rotated token without a restart. With no path configured
/// requests pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct BearerToken {
    path: Option<PathBuf>,
    cache: Arc<Mutex<Option<Cached>>>,
}

impl BearerToken {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cache: Arc::default(),
        }
    }

    fn header(&self) -> Result<Option<MetadataValue<Ascii>>, Status> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let meta = std::fs::metadata(path).map_err(|e| unreadable(path, &e))?;
        let modified = meta.modified().map_err(|e| unreadable(path, &e))?;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache
            .as_ref()
            .filter(|c| c.modified == modified && c.len == meta.len())
        {
            return Ok(Some(hit.value.clone()));
        }

        let value = read_header(path)?;
        *cache = Some(Cached {
            modified,
            len: meta.len(),
            value: value.clone(),
        });
        tracing::debug!(path = %path.display(), "loaded access token");
        Ok(Some(value))
    }
}

fn unreadable(path: &Path, e: &std::io::Error) -> Status {
    Status::unauthenticated(format!("cannot read access token {}: {e}", path.display()))
}

fn read_header(path: &Path) -> Result<MetadataValue<Ascii>, Status> {
    let raw = std::fs::read_to_string(path).map_err(|e| unreadable(path, &e))?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(Status::unauthenticated(format!(
            "access token {} is empty",
            path.display()
        )));
    }
    format!("Bearer {token}")
        .parse()
        .map_err(|_| Status::unauthenticated("access token is not valid header text"))
}

impl Interceptor for BearerToken {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(value) = self.header()? {
            request.metadata_mut().insert("authorization", value);
        }
        Ok(request)
    }
}
