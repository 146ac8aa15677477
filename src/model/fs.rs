use std::{collections::BTreeMap, fmt, str::FromStr};

use thiserror::Error;

/// Failure reported by an object store client. The message is the store's own
/// text and is carried through to the adapter error untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FSError {
    pub message: String,
    pub not_found: bool,
}

impl FSError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: true,
        }
    }
}

/// One result of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Directory {
        path: String,
    },
    File {
        path: String,
        last_modified: Option<i64>,
        size: u64,
    },
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::Directory { path } => path,
            Entry::File { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File { .. })
    }
}

/// Attributes of a single object. Metadata queries fill size, timestamp and
/// mime type together; visibility queries fill only `visibility`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Option<String>,
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
}

impl FileAttributes {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Canned ACL sent to the store.
    pub fn as_acl(&self) -> &'static str {
        match self {
            Visibility::Public => "public-read",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Only the exact string `public` is public; everything else is private.
impl From<&str> for Visibility {
    fn from(value: &str) -> Self {
        if value == "public" {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl FromStr for Visibility {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Visibility::from(s))
    }
}

/// Per-call options forwarded to the store on writes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub check_md5: bool,
}

impl WriteOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_check_md5(mut self, check_md5: bool) -> Self {
        self.check_md5 = check_md5;
        self
    }
}
