//! Operations that stream the response body to a file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use http::header::{IF_RANGE, RANGE};
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::backend::ReqwestBackend;
use crate::backend::types::BackendRequest;
use crate::destination::{Destination, DestinationOptions};
use crate::operation::{OperationState, Progress, Task};
use crate::request::UrlRequest;
use crate::response::ResponseMeta;
use crate::session::Session;
use crate::validation::Validator;
use crate::{Error, Result};

/// Response from a completed download operation.
///
/// # Examples
///
/// ```no_run
/// # use requestable::{Downloadable, Requestable, Session};
/// # struct Report(Session);
/// # impl Requestable for Report {
/// #     fn session(&self) -> &Session { &self.0 }
/// #     fn path(&self) -> Option<String> { Some("report.csv".into()) }
/// # }
/// # impl Downloadable for Report {}
/// # async fn example(report: Report) -> requestable::Result<()> {
/// let response = report.as_request()?.response().await?;
///
/// println!("Downloaded to: {:?}", response.file_path);
/// println!("Downloaded {} bytes", response.bytes_downloaded);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DownloadResponse {
    /// Path where the file was saved
    pub file_path: PathBuf,
    /// Size of the downloaded file, including any resumed prefix
    pub bytes_downloaded: u64,
    /// Status line and headers of the response
    pub meta: ResponseMeta,
}

/// State needed to continue an interrupted download.
///
/// Serialized as JSON; obtain it from [`DownloadOperation::resume_data`] and
/// hand it back through [`Downloadable::resume_data`](crate::Downloadable::resume_data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    /// URL of the interrupted request
    pub url: String,
    /// Partial file on disk
    pub path: PathBuf,
    /// Bytes already written to `path`
    pub offset: u64,
    /// Entity tag of the partial content, sent as `If-Range`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ResumeData {
    /// Encode as opaque bytes
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode bytes produced by [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Whether this data was recorded for `url`
    pub fn matches(&self, url: &Url) -> bool {
        Url::parse(&self.url).is_ok_and(|recorded| recorded == *url)
    }
}

#[derive(Default)]
struct PartialFile {
    path: ArcSwapOption<PathBuf>,
    etag: ArcSwapOption<String>,
}

impl PartialFile {
    fn set_path(&self, path: Option<PathBuf>) {
        self.path.store(path.map(Arc::new));
    }

    fn set_etag(&self, etag: Option<String>) {
        self.etag.store(etag.map(Arc::new));
    }
}

/// A request whose response body is written to disk
#[derive(Clone)]
pub struct DownloadOperation {
    task: Task<DownloadResponse>,
    request: Arc<UrlRequest>,
    progress: Progress,
    partial: Arc<PartialFile>,
}

impl DownloadOperation {
    pub(crate) fn new(
        session: &Session,
        request: UrlRequest,
        resume_data: Option<Bytes>,
        destination: Option<Destination>,
        validator: Option<Validator>,
    ) -> Self {
        let progress = Progress::default();
        let partial = Arc::new(PartialFile::default());

        let resume = resume_data
            .and_then(|bytes| match ResumeData::from_bytes(&bytes) {
                Ok(resume) => Some(resume),
                Err(e) => {
                    tracing::warn!("Ignoring invalid resume data: {}", e);
                    None
                }
            })
            .filter(|resume| {
                let matches = resume.matches(&request.url);
                if !matches {
                    tracing::warn!(
                        "Ignoring resume data recorded for {}, request is for {}",
                        resume.url,
                        request.url
                    );
                }
                matches
            });
        if let Some(resume) = &resume {
            partial.set_path(Some(resume.path.clone()));
            partial.set_etag(resume.etag.clone());
        }

        let label = format!("download {} {}", request.method, request.url);
        let job = download(
            session.backend().clone(),
            request.clone(),
            resume,
            destination,
            validator,
            progress.clone(),
            partial.clone(),
        );

        Self {
            task: Task::new(label, Box::pin(job)),
            request: Arc::new(request),
            progress,
            partial,
        }
    }

    /// The request this operation sends
    pub fn request(&self) -> &UrlRequest {
        &self.request
    }

    /// Current lifecycle state
    pub fn state(&self) -> OperationState {
        self.task.state()
    }

    /// Whether the operation has been resumed
    pub fn is_started(&self) -> bool {
        self.state() != OperationState::Idle
    }

    /// Start the operation. Must be called from within a tokio runtime.
    pub fn resume(&self) -> bool {
        self.task.resume()
    }

    /// Cancel the operation, keeping the partial file for [`resume_data`](Self::resume_data)
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    /// Receive `(bytes_written, total_if_known)` as the file is written
    pub fn on_progress<F>(&self, callback: F) -> &Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.progress.set(Arc::new(callback));
        self
    }

    /// Wait for the download to finish
    pub async fn response(&self) -> Result<DownloadResponse> {
        self.task.wait().await
    }

    /// Opaque data to continue this download later.
    ///
    /// Available once the operation was cancelled or failed with a non-empty
    /// partial file on disk.
    pub fn resume_data(&self) -> Option<Bytes> {
        if !self.state().is_finished() {
            return None;
        }

        let path = self.partial.path.load_full()?;
        let offset = std::fs::metadata(path.as_path()).ok()?.len();
        if offset == 0 {
            return None;
        }

        ResumeData {
            url: self.request.url.to_string(),
            path: path.as_path().to_path_buf(),
            offset,
            etag: self.partial.etag.load_full().map(|etag| etag.as_str().to_string()),
        }
        .to_bytes()
        .ok()
    }
}

impl std::fmt::Debug for DownloadOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOperation")
            .field("request", &self.request)
            .field("state", &self.state())
            .finish()
    }
}

fn temporary_path() -> Result<PathBuf> {
    tempfile::Builder::new()
        .prefix("requestable-")
        .suffix(".download")
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|e| Error::Io(e.error))
}

async fn download(
    backend: ReqwestBackend,
    request: UrlRequest,
    resume: Option<ResumeData>,
    destination: Option<Destination>,
    validator: Option<Validator>,
    progress: Progress,
    partial: Arc<PartialFile>,
) -> Result<DownloadResponse> {
    let (path, start_byte, etag) = match resume {
        Some(resume) => match tokio::fs::metadata(&resume.path).await {
            Ok(metadata) => (resume.path, metadata.len(), resume.etag),
            Err(_) => {
                tracing::warn!(
                    "Partial file {} is gone, restarting download",
                    resume.path.display()
                );
                (temporary_path()?, 0, None)
            }
        },
        None => (temporary_path()?, 0, None),
    };
    partial.set_path(Some(path.clone()));
    partial.set_etag(etag.clone());

    let mut start_byte = start_byte;
    let mut response = backend
        .execute(ranged_request(&request, start_byte, etag.as_deref())?)
        .await?;

    // Range not satisfiable means the partial file is already complete, as long
    // as the remote length agrees with it
    if start_byte > 0
        && response.status == StatusCode::RANGE_NOT_SATISFIABLE
        && complete_length(&response.meta()) != Some(start_byte)
    {
        tracing::debug!("Partial file does not match the remote length, restarting download");
        start_byte = 0;
        response = backend.execute(BackendRequest::from(request)).await?;
    }

    let meta = response.meta();
    let already_complete =
        start_byte > 0 && meta.status == StatusCode::RANGE_NOT_SATISFIABLE;

    if !already_complete {
        if let Some(validator) = &validator {
            if let Err(e) = validator.validate(&meta) {
                partial.set_path(None);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
        }
    }

    if let Some(etag) = meta.header("etag") {
        partial.set_etag(Some(etag.to_string()));
    }

    let mut bytes_downloaded = start_byte;
    if !already_complete {
        let append = start_byte > 0 && meta.status == StatusCode::PARTIAL_CONTENT;
        if start_byte > 0 && !append {
            tracing::debug!("Server ignored range request, restarting download");
            bytes_downloaded = 0;
        }

        let total_size = response.content_length.map(|len| len + bytes_downloaded);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .await?;

        progress.report(bytes_downloaded, total_size);
        while let Some(chunk) = response.body_receiver.recv().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes_downloaded += chunk.len() as u64;
            progress.report(bytes_downloaded, total_size);
        }
        file.flush().await?;
    }

    let file_path = match &destination {
        Some(destination) => {
            let (target, options) = destination(&path, &meta);
            move_into_place(&path, &target, options).await?;
            target
        }
        None => path,
    };
    partial.set_path(None);

    Ok(DownloadResponse {
        file_path,
        bytes_downloaded,
        meta,
    })
}

fn ranged_request(
    request: &UrlRequest,
    start_byte: u64,
    etag: Option<&str>,
) -> Result<BackendRequest> {
    let mut backend_request = BackendRequest::from(request.clone());
    if start_byte > 0 {
        let range = HeaderValue::from_str(&format!("bytes={}-", start_byte))
            .map_err(|e| Error::Encoding(format!("Invalid range header: {}", e)))?;
        backend_request.headers.insert(RANGE, range);
        if let Some(value) = etag.and_then(|etag| HeaderValue::from_str(etag).ok()) {
            backend_request.headers.insert(IF_RANGE, value);
        }
        tracing::debug!("Resuming download at byte {}", start_byte);
    }
    Ok(backend_request)
}

/// Full length from a `Content-Range: bytes */<length>` header
fn complete_length(meta: &ResponseMeta) -> Option<u64> {
    let range = meta.header("content-range")?.trim();
    let (unit, rest) = range.split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    rest.rsplit_once('/')?.1.trim().parse().ok()
}

async fn move_into_place(from: &Path, to: &Path, options: DestinationOptions) -> Result<()> {
    if options.create_intermediate_directories {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if tokio::fs::try_exists(to).await? {
        if !options.remove_previous_file {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            )));
        }
        tokio::fs::remove_file(to).await?;
    }

    // Rename fails across filesystems
    if tokio::fs::rename(from, to).await.is_err() {
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}
