//! An object storage bucket presented through a filesystem-like interface.
//!
//! [`fs::ObjectFS`] translates paths into object keys and drives any client
//! implementing [`adapters::Object`]: the S3 client for real buckets, or the
//! in-memory mock for tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod fs;
pub mod listing;
pub mod model;
pub mod stream;
pub mod util;

pub use error::{AdapterError, AdapterResult, ErrorKind, MetadataType};
pub use fs::{FilesystemAdapter, ObjectFS, TemporaryUrlGenerator};
pub use model::fs::{Entry, FileAttributes, Visibility, WriteOptions};
