use crate::binding::{BindError, FormData};
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::Limited;
use http_body_util::combinators::UnsyncBoxBody;
use std::error::Error;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{Mutex, OnceCell};
use tracing::trace;

pub(crate) type BoxError = Box<dyn Error + Send + Sync>;

/// The request body shared by every extractor of a single request.
///
/// The underlying stream is collected at most once, the bytes are cached so a json binder and a
/// `String` extractor can both read it. The parsed form is cached the same way.
#[derive(Clone)]
pub struct RequestBody {
    inner: Arc<Mutex<BodyState>>,
    form: Arc<OnceCell<Arc<FormData>>>,
}

enum BodyState {
    Pending(UnsyncBoxBody<Bytes, BoxError>),
    Collected(Bytes),
    Consumed,
}

impl RequestBody {
    pub fn new<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::with_state(BodyState::Pending(UnsyncBoxBody::new(body.map_err(Into::into))))
    }

    pub fn empty() -> Self {
        Self::with_state(BodyState::Collected(Bytes::new()))
    }

    fn with_state(state: BodyState) -> Self {
        Self { inner: Arc::new(Mutex::new(state)), form: Arc::new(OnceCell::new()) }
    }

    /// Collects the whole body, later calls return the cached bytes
    pub async fn bytes(&self) -> Result<Bytes, BindError> {
        self.collect(None).await
    }

    /// Like [`RequestBody::bytes`], failing as soon as the body grows beyond `limit` bytes
    pub async fn bytes_limited(&self, limit: u64) -> Result<Bytes, BindError> {
        self.collect(Some(usize::try_from(limit).unwrap_or(usize::MAX))).await
    }

    async fn collect(&self, limit: Option<usize>) -> Result<Bytes, BindError> {
        let mut guard = self.inner.lock().await;
        match std::mem::replace(&mut *guard, BodyState::Consumed) {
            BodyState::Pending(body) => {
                let collected = match limit {
                    Some(limit) => collect_limited(body, limit).await,
                    None => body.collect().await,
                };
                let bytes = collected.map_err(|e| BindError::Body(e.to_string()))?.to_bytes();
                trace!(len = bytes.len(), "request body collected");
                *guard = BodyState::Collected(bytes.clone());
                Ok(bytes)
            }
            BodyState::Collected(bytes) => {
                let len = bytes.len();
                *guard = BodyState::Collected(bytes.clone());
                match limit {
                    Some(limit) if len > limit => Err(BindError::Body("length limit exceeded".into())),
                    _ => Ok(bytes),
                }
            }
            BodyState::Consumed => Err(BindError::Body("body has been consumed".into())),
        }
    }

    pub(crate) fn form_cell(&self) -> &OnceCell<Arc<FormData>> {
        &self.form
    }
}

type CollectFuture = Pin<Box<dyn Future<Output = Result<http_body_util::Collected<Bytes>, BoxError>> + Send>>;

// boxed with a concrete type so the future stays `Send` inside `async_trait` futures
fn collect_limited(body: UnsyncBoxBody<Bytes, BoxError>, limit: usize) -> CollectFuture {
    Box::pin(Limited::new(body, limit).collect())
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::with_state(BodyState::Collected(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&'static str> for RequestBody {
    fn from(value: &'static str) -> Self {
        Self::from(Bytes::from_static(value.as_bytes()))
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBody").finish_non_exhaustive()
    }
}

pub struct ResponseBody {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(UnsyncBoxBody<Bytes, BoxError>),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        Self { inner: Kind::Once(Some(bytes)) }
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self { inner: Kind::Stream(UnsyncBoxBody::new(body.map_err(Into::into))) }
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Kind::Once(bytes) => f.debug_tuple("ResponseBody::Once").field(bytes).finish(),
            Kind::Stream(_) => f.write_str("ResponseBody::Stream"),
        }
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        if value.is_empty() { Self::empty() } else { Self::once(Bytes::from(value)) }
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        if value.is_empty() { Self::empty() } else { Self::once(Bytes::from(value)) }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self::once(bytes) }
    }
}

impl From<()> for ResponseBody {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl From<Option<Bytes>> for ResponseBody {
    fn from(option: Option<Bytes>) -> Self {
        match option {
            Some(bytes) => Self::from(bytes),
            None => Self::empty(),
        }
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        if value.is_empty() { Self::empty() } else { Self::once(Bytes::from_static(value.as_bytes())) }
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let kind = &mut self.get_mut().inner;
        match kind {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => {
                let pin = Pin::new(box_body);
                pin.poll_frame(cx)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}
