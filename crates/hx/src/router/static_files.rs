use crate::body::{RequestBody, ResponseBody};
use crate::handler::{HandlerError, RequestHandler};
use crate::responder::text_response;
use crate::RequestContext;
use async_trait::async_trait;
use futures::TryStreamExt;
use http::{HeaderValue, Response, StatusCode};
use http_body::Frame;
use http_body_util::StreamBody;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// The route variable holding the requested file below the mount point
pub(crate) const FILEPATH_PARAM: &str = "filepath";

/// Serves the files of a directory.
///
/// Registered by [`RouterBuilder::static_files`](crate::router::RouterBuilder::static_files) under
/// `{prefix}/{*filepath}`. A directory serves its `index.html`, paths with `..` segments and missing
/// files answer `404`. Directories are never listed.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file on disk for a request path, `None` when the path leaves the root
    fn resolve(&self, filepath: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in filepath.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                segment if segment.contains('\\') => return None,
                segment => path.push(segment),
            }
        }
        Some(path)
    }

    async fn open(path: &Path) -> io::Result<(File, u64, PathBuf)> {
        let metadata = tokio::fs::metadata(path).await?;
        let path = if metadata.is_dir() { path.join("index.html") } else { path.to_path_buf() };

        let file = File::open(&path).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "directory without index.html"));
        }
        Ok((file, metadata.len(), path))
    }
}

#[async_trait]
impl RequestHandler for StaticFiles {
    async fn invoke(&self, req: &mut RequestContext, _body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        let filepath = req.path_params().get(FILEPATH_PARAM).unwrap_or_default();
        let Some(path) = self.resolve(filepath) else {
            debug!(filepath, "reject static file path");
            return Ok(not_found());
        };

        let (file, len, path) = match Self::open(&path).await {
            Ok(opened) => opened,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(not_found()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(text_response(StatusCode::FORBIDDEN, "403 Forbidden\n".into()));
            }
            Err(e) => return Err(e.into()),
        };

        let stream = ReaderStream::new(file).map_ok(Frame::data);
        let mut response = Response::new(ResponseBody::stream(StreamBody::new(stream)));
        let headers = response.headers_mut();
        headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(len));
        Ok(response)
    }
}

/// Media type by file extension
pub(crate) fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

pub(crate) fn not_found() -> Response<ResponseBody> {
    let mut response = text_response(StatusCode::NOT_FOUND, "404 page not found\n".into());
    response.headers_mut().insert(http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
