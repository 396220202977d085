use crate::settings::CodecError;
use std::convert::Infallible;
use std::fmt::Display;
use thiserror::Error;

/// Everything that can go wrong while turning a request into a typed value.
///
/// A destination that is not a pointer can not be expressed here: binders return owned values,
/// so only the "struct required" half of that check exists at runtime.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("binding: destination must be a struct")]
    StructRequired,

    #[error("binding: unsupported type: {kind}")]
    UnsupportedType { kind: &'static str },

    #[error("binding: too many fields")]
    TooManyFields,

    #[error("binding field {field:?}: {source}")]
    Field { field: String, source: Box<BindError> },

    #[error("binding slice element {index}: {source}")]
    Element { index: usize, source: Box<BindError> },

    #[error("parsing {kind} {value:?}: {reason}")]
    Parse { kind: &'static str, value: String, reason: String },

    #[error("http: named cookie not present")]
    MissingCookie,

    #[error("missing request extension: {type_name}")]
    MissingExtension { type_name: &'static str },

    #[error("invalid form data: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("invalid multipart data: {0}")]
    Multipart(#[from] multer::Error),

    #[error("invalid json body: {0}")]
    Json(#[source] CodecError),

    #[error("invalid xml body: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("reading request body: {0}")]
    Body(String),

    #[error("{0}")]
    Custom(String),
}

impl BindError {
    pub(crate) fn field(field: &str, source: BindError) -> Self {
        BindError::Field { field: field.to_owned(), source: Box::new(source) }
    }

    pub(crate) fn element(index: usize, source: BindError) -> Self {
        BindError::Element { index, source: Box::new(source) }
    }

    pub(crate) fn parse(kind: &'static str, value: &str, reason: impl Display) -> Self {
        BindError::Parse { kind, value: value.to_owned(), reason: reason.to_string() }
    }

    /// Walks `Field` and `Element` wrappers down to the error that caused them
    pub fn root_cause(&self) -> &BindError {
        match self {
            BindError::Field { source, .. } | BindError::Element { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<Infallible> for BindError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl serde::de::Error for BindError {
    fn custom<T: Display>(msg: T) -> Self {
        BindError::Custom(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::BindError;

    #[test]
    fn nested_errors_name_field_and_element() {
        let err = BindError::field("ids", BindError::element(2, BindError::parse("int", "x", "invalid digit found in string")));
        assert_eq!(err.to_string(), "binding field \"ids\": binding slice element 2: parsing int \"x\": invalid digit found in string");
        assert!(matches!(err.root_cause(), BindError::Parse { kind: "int", .. }));
    }

    #[test]
    fn missing_cookie_message() {
        assert_eq!(BindError::MissingCookie.to_string(), "http: named cookie not present");
    }
}
