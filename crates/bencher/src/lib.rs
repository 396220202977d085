/// A request payload bound by the benchmarks
#[derive(Debug, Copy, Clone)]
pub struct Payload {
    name: &'static str,
    kind: PayloadKind,
    content: &'static str,
}

impl Payload {
    pub const fn new(name: &'static str, kind: PayloadKind, content: &'static str) -> Self {
        Self { name, kind, content }
    }

    pub const fn query(name: &'static str, content: &'static str) -> Self {
        Self::new(name, PayloadKind::Query, content)
    }

    pub const fn form(name: &'static str, content: &'static str) -> Self {
        Self::new(name, PayloadKind::Form, content)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    /// The request line target carrying this payload
    pub fn uri(&self, path: &str) -> String {
        match self.kind {
            PayloadKind::Query => format!("{path}?{}", self.content),
            PayloadKind::Form => path.to_owned(),
        }
    }

    /// The request body carrying this payload
    pub fn body(&self) -> &'static str {
        match self.kind {
            PayloadKind::Query => "",
            PayloadKind::Form => self.content,
        }
    }

    pub fn content_type(&self) -> Option<&'static str> {
        match self.kind {
            PayloadKind::Query => None,
            PayloadKind::Form => Some("application/x-www-form-urlencoded"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Query,
    Form,
}
