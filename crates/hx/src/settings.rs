//! Per-router configuration.
//!
//! [`Settings`] is built once by [`RouterBuilder`](crate::router::RouterBuilder) and shared by every
//! [`RequestContext`](crate::RequestContext) the router creates. It replaces process wide mutable
//! state: the json codec used by binders and responders is chosen when the router is built and can
//! not change afterwards.

use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub type CodecError = Box<dyn Error + Send + Sync>;

/// Encodes and decodes json documents for binders and [`JsonResponse`](crate::responder::JsonResponse).
pub trait JsonCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// The default codec backed by `serde_json`
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec {
    pretty: bool,
}

impl SerdeJsonCodec {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indents encoded documents, decoding is unaffected
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl JsonCodec for SerdeJsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty { serde_json::to_vec_pretty(value)? } else { serde_json::to_vec(value)? };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Clone)]
pub struct Settings {
    json: Arc<dyn JsonCodec>,
}

impl Settings {
    pub fn new(json: impl JsonCodec + 'static) -> Self {
        Self { json: Arc::new(json) }
    }

    pub fn json(&self) -> &dyn JsonCodec {
        self.json.as_ref()
    }

    pub(crate) fn set_json(&mut self, json: Arc<dyn JsonCodec>) {
        self.json = json;
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(SerdeJsonCodec::new())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}
