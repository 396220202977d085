use crate::RequestContext;
use crate::binding::{BindError, Values};
use crate::body::RequestBody;
use bytes::Bytes;
use http::Method;
use multer::{Constraints, Multipart, SizeLimit};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Upper bound of a multipart body, the whole body is held in memory
pub const MAX_MULTIPART_MEMORY: u64 = 32 << 20;

/// Uploaded files keyed by their form field name
pub type Files = HashMap<String, Vec<FileHeader>>;

/// A file part of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

impl FileHeader {
    pub(crate) const SERDE_NAME: &'static str = "$hx::FileHeader";

    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self { filename: filename.into(), content_type, data }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl<'de> Deserialize<'de> for FileHeader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct(Self::SERDE_NAME, &["filename", "content_type", "data"], FileHeaderVisitor)
    }
}

struct FileHeaderVisitor;

impl<'de> Visitor<'de> for FileHeaderVisitor {
    type Value = FileHeader;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a multipart file")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FileHeader, A::Error> {
        let mut filename = None;
        let mut content_type = None;
        let mut data = Bytes::new();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "filename" => filename = Some(map.next_value::<String>()?),
                "content_type" => content_type = Some(map.next_value::<String>()?),
                "data" => data = map.next_value::<RawBytes>()?.0,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        let filename = filename.ok_or_else(|| de::Error::missing_field("filename"))?;
        Ok(FileHeader { filename, content_type, data })
    }
}

struct RawBytes(Bytes);

impl<'de> Deserialize<'de> for RawBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawBytesVisitor;

        impl Visitor<'_> for RawBytesVisitor {
            type Value = RawBytes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("file content")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<RawBytes, E> {
                Ok(RawBytes(Bytes::copy_from_slice(v)))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<RawBytes, E> {
                Ok(RawBytes(Bytes::from(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawBytes, E> {
                Ok(RawBytes(Bytes::copy_from_slice(v.as_bytes())))
            }
        }

        deserializer.deserialize_byte_buf(RawBytesVisitor)
    }
}

/// Everything a request carries as form input.
///
/// `post` holds `application/x-www-form-urlencoded` body values, `multipart` the text parts of a
/// `multipart/form-data` body and `files` its file parts. Url-encoded bodies are only read for POST,
/// PUT and PATCH, multipart bodies for every method.
#[derive(Debug, Default, Clone)]
pub struct FormData {
    query: Values,
    post: Values,
    multipart: Values,
    files: Files,
}

impl FormData {
    /// Parses the query string and the form body.
    ///
    /// A multipart body larger than [`MAX_MULTIPART_MEMORY`] is rejected while it is collected.
    pub async fn parse(req: &RequestContext, body: &RequestBody) -> Result<Self, BindError> {
        let mut form = FormData { query: Values::parse(req.query())?, ..FormData::default() };

        let Some(content_type) = req.content_type() else {
            return Ok(form);
        };
        let Ok(mime) = content_type.parse::<mime::Mime>() else {
            return Ok(form);
        };

        if mime.essence_str().eq_ignore_ascii_case(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str()) {
            if matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
                form.post = Values::parse_bytes(&body.bytes().await?)?;
            }
        } else if mime.essence_str().eq_ignore_ascii_case(mime::MULTIPART_FORM_DATA.essence_str()) {
            let boundary = multer::parse_boundary(content_type)?;
            form.read_multipart(body.bytes_limited(MAX_MULTIPART_MEMORY).await?, boundary).await?;
        }

        Ok(form)
    }

    async fn read_multipart(&mut self, bytes: Bytes, boundary: String) -> Result<(), BindError> {
        let stream = futures::stream::once(async move { Ok::<_, Infallible>(bytes) });
        let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(MAX_MULTIPART_MEMORY));
        let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                debug!("skip multipart field without name");
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let content_type = field.content_type().map(ToString::to_string);
                    let data = field.bytes().await?;
                    self.files.entry(name).or_default().push(FileHeader::new(filename, content_type, data));
                }
                None => {
                    let text = field.text().await?;
                    self.multipart.append(name, text);
                }
            }
        }
        Ok(())
    }

    pub fn query(&self) -> &Values {
        &self.query
    }

    pub fn post(&self) -> &Values {
        &self.post
    }

    pub fn multipart(&self) -> &Values {
        &self.multipart
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    /// The first value of `key`: body values first, then query values, then multipart values
    pub fn value(&self, key: &str) -> Option<&str> {
        self.post.get(key).or_else(|| self.query.get(key)).or_else(|| self.multipart.get(key))
    }

    /// One map for struct binding.
    ///
    /// A key keeps the values of the last source that has it, in this order: query, url-encoded body
    /// followed by query, multipart.
    pub fn merged(&self) -> Values {
        let mut merged = self.query.clone();
        for (key, values) in self.post.iter() {
            let mut all = values.to_vec();
            all.extend_from_slice(self.query.get_all(key));
            merged.set(key, all);
        }
        for (key, values) in self.multipart.iter() {
            merged.set(key, values.to_vec());
        }
        merged
    }
}

/// Parses the form of this request once, later calls share the result
pub async fn parse_form(req: &RequestContext, body: &RequestBody) -> Result<Arc<FormData>, BindError> {
    body.form_cell().get_or_try_init(|| async { FormData::parse(req, body).await.map(Arc::new) }).await.cloned()
}
