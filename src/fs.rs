use std::{
    io::{Cursor, Read},
    sync::Arc,
};

use time::OffsetDateTime;
use tracing::{error, info, span, Level};

use crate::{
    adapters,
    error::{AdapterError, AdapterResult, MetadataType},
    listing::ListContents,
    model::fs::{Entry, FileAttributes, Visibility, WriteOptions},
    stream, util,
};

/// Filesystem operations over a flat object namespace.
pub trait FilesystemAdapter {
    fn file_exists(&self, path: &str) -> AdapterResult<bool>;

    /// Same key probe as [`FilesystemAdapter::file_exists`]; a directory that
    /// exists only as a prefix of other keys is not detected.
    fn directory_exists(&self, path: &str) -> AdapterResult<bool>;

    fn write(&self, path: &str, contents: &[u8], options: &WriteOptions) -> AdapterResult<()>;

    fn write_stream(
        &self,
        path: &str,
        contents: &mut dyn Read,
        options: &WriteOptions,
    ) -> AdapterResult<()>;

    fn read(&self, path: &str) -> AdapterResult<Vec<u8>>;

    fn read_stream(&self, path: &str) -> AdapterResult<Box<dyn Read + Send>>;

    fn delete(&self, path: &str) -> AdapterResult<()>;

    fn delete_directory(&self, path: &str) -> AdapterResult<()>;

    fn create_directory(&self, path: &str, options: &WriteOptions) -> AdapterResult<()>;

    fn set_visibility(&self, path: &str, visibility: Visibility) -> AdapterResult<()>;

    /// The store's ACL string, as is.
    fn visibility(&self, path: &str) -> AdapterResult<FileAttributes>;

    fn mime_type(&self, path: &str) -> AdapterResult<FileAttributes>;

    fn last_modified(&self, path: &str) -> AdapterResult<FileAttributes>;

    fn file_size(&self, path: &str) -> AdapterResult<FileAttributes>;

    fn list_contents<'a>(
        &'a self,
        path: &str,
        deep: bool,
    ) -> Box<dyn Iterator<Item = AdapterResult<Entry>> + 'a>;

    fn move_file(&self, source: &str, destination: &str, options: &WriteOptions)
        -> AdapterResult<()>;

    fn copy_file(&self, source: &str, destination: &str, options: &WriteOptions)
        -> AdapterResult<()>;
}

pub trait TemporaryUrlGenerator {
    fn temporary_url(
        &self,
        path: &str,
        expires_at: OffsetDateTime,
        options: &WriteOptions,
    ) -> AdapterResult<String>;
}

/// A single bucket seen as a filesystem.
pub struct ObjectFS {
    pub client: Arc<dyn adapters::Object>,
    pub bucket: String,
}

impl ObjectFS {
    pub fn new(client: Arc<dyn adapters::Object>, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    fn get_metadata(&self, path: &str, metadata_type: MetadataType) -> AdapterResult<FileAttributes> {
        let meta = self
            .client
            .fs_get_object_meta(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="get_object_meta");
                AdapterError::metadata(path, metadata_type, &err)
            })?;

        Ok(FileAttributes {
            path: path.to_string(),
            file_size: meta.content_length,
            visibility: None,
            last_modified: util::time::parse_optional_timestamp(meta.last_modified.as_deref()),
            mime_type: meta.content_type,
        })
    }
}

impl FilesystemAdapter for ObjectFS {
    fn file_exists(&self, path: &str) -> AdapterResult<bool> {
        let span = span!(Level::INFO, "file_exists", context = "file_exists");
        let _e = span.enter();
        info!(path = path, "called");

        self.client
            .fs_object_exists(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="object_exists");
                AdapterError::check_existence(path, &err)
            })
    }

    fn directory_exists(&self, path: &str) -> AdapterResult<bool> {
        self.file_exists(path)
    }

    fn write(&self, path: &str, contents: &[u8], options: &WriteOptions) -> AdapterResult<()> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(path = path, size = contents.len(), "called");

        self.client
            .fs_put_object(&self.bucket, path, contents.to_vec(), options)
            .map_err(|err| {
                error!(error_message=%err, error_group="put_object");
                AdapterError::write(path, &err)
            })
    }

    fn write_stream(
        &self,
        path: &str,
        contents: &mut dyn Read,
        options: &WriteOptions,
    ) -> AdapterResult<()> {
        let span = span!(Level::INFO, "write_stream", context = "write_stream");
        let _e = span.enter();
        info!(path = path, "called");

        let written = stream::append_chunks(&*self.client, &self.bucket, path, contents, options)?;
        info!(path = path, size = written, "written");

        Ok(())
    }

    fn read(&self, path: &str) -> AdapterResult<Vec<u8>> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(path = path, "called");

        self.client
            .fs_get_object(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="get_object");
                AdapterError::read(path, &err)
            })
    }

    fn read_stream(&self, path: &str) -> AdapterResult<Box<dyn Read + Send>> {
        let contents = self.read(path)?;

        Ok(Box::new(Cursor::new(contents)))
    }

    fn delete(&self, path: &str) -> AdapterResult<()> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, "called");

        self.client
            .fs_delete_object(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="delete_object");
                AdapterError::delete(path, err.message)
            })
    }

    fn delete_directory(&self, path: &str) -> AdapterResult<()> {
        let span = span!(Level::INFO, "delete_directory", context = "delete_directory");
        let _e = span.enter();
        info!(path = path, "called");

        let mut keys = Vec::new();
        for entry in self.list_contents(path, true) {
            let entry = entry.map_err(|err| AdapterError::delete(path, err.reason()))?;
            keys.push(entry.path().to_string());
        }

        if keys.is_empty() {
            return Ok(());
        }

        info!(path = path, count = keys.len(), "deleting");
        self.client
            .fs_delete_objects(&self.bucket, &keys)
            .map_err(|err| {
                error!(error_message=%err, error_group="delete_objects");
                AdapterError::delete(path, err.message)
            })
    }

    fn create_directory(&self, path: &str, _options: &WriteOptions) -> AdapterResult<()> {
        let span = span!(Level::INFO, "create_directory", context = "create_directory");
        let _e = span.enter();
        info!(path = path, "called");

        self.client
            .fs_create_object_dir(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="create_object_dir");
                AdapterError::create_directory(path, &err)
            })
    }

    fn set_visibility(&self, path: &str, visibility: Visibility) -> AdapterResult<()> {
        let span = span!(Level::INFO, "set_visibility", context = "set_visibility");
        let _e = span.enter();
        info!(path = path, visibility = %visibility, "called");

        self.client
            .fs_put_object_acl(&self.bucket, path, visibility.as_acl())
            .map_err(|err| {
                error!(error_message=%err, error_group="put_object_acl");
                AdapterError::set_visibility(path, &err)
            })
    }

    fn visibility(&self, path: &str) -> AdapterResult<FileAttributes> {
        let span = span!(Level::INFO, "visibility", context = "visibility");
        let _e = span.enter();
        info!(path = path, "called");

        let acl = self
            .client
            .fs_get_object_acl(&self.bucket, path)
            .map_err(|err| {
                error!(error_message=%err, error_group="get_object_acl");
                AdapterError::metadata(path, MetadataType::Visibility, &err)
            })?;

        Ok(FileAttributes {
            visibility: Some(acl),
            ..FileAttributes::new(path)
        })
    }

    fn mime_type(&self, path: &str) -> AdapterResult<FileAttributes> {
        let span = span!(Level::INFO, "mime_type", context = "mime_type");
        let _e = span.enter();
        info!(path = path, "called");

        self.get_metadata(path, MetadataType::MimeType)
    }

    fn last_modified(&self, path: &str) -> AdapterResult<FileAttributes> {
        let span = span!(Level::INFO, "last_modified", context = "last_modified");
        let _e = span.enter();
        info!(path = path, "called");

        self.get_metadata(path, MetadataType::LastModified)
    }

    fn file_size(&self, path: &str) -> AdapterResult<FileAttributes> {
        let span = span!(Level::INFO, "file_size", context = "file_size");
        let _e = span.enter();
        info!(path = path, "called");

        self.get_metadata(path, MetadataType::FileSize)
    }

    fn list_contents<'a>(
        &'a self,
        path: &str,
        deep: bool,
    ) -> Box<dyn Iterator<Item = AdapterResult<Entry>> + 'a> {
        info!(path = path, deep = deep, "list_contents called");

        Box::new(ListContents::new(&*self.client, &self.bucket, path, deep))
    }

    fn move_file(
        &self,
        source: &str,
        destination: &str,
        _options: &WriteOptions,
    ) -> AdapterResult<()> {
        let span = span!(Level::INFO, "move_file", context = "move_file");
        let _e = span.enter();
        info!(source = source, destination = destination, "called");

        self.client
            .fs_copy_object(&self.bucket, source, &self.bucket, destination)
            .and_then(|_| self.client.fs_delete_object(&self.bucket, source))
            .map_err(|err| {
                error!(error_message=%err, error_group="move_object");
                AdapterError::move_file(source, destination, &err)
            })
    }

    fn copy_file(
        &self,
        source: &str,
        destination: &str,
        _options: &WriteOptions,
    ) -> AdapterResult<()> {
        let span = span!(Level::INFO, "copy_file", context = "copy_file");
        let _e = span.enter();
        info!(source = source, destination = destination, "called");

        self.client
            .fs_copy_object(&self.bucket, source, &self.bucket, destination)
            .map_err(|err| {
                error!(error_message=%err, error_group="copy_object");
                AdapterError::copy_file(source, destination, &err)
            })
    }
}

impl TemporaryUrlGenerator for ObjectFS {
    fn temporary_url(
        &self,
        path: &str,
        expires_at: OffsetDateTime,
        _options: &WriteOptions,
    ) -> AdapterResult<String> {
        let span = span!(Level::INFO, "temporary_url", context = "temporary_url");
        let _e = span.enter();
        info!(path = path, expires_at = expires_at.unix_timestamp(), "called");

        self.client
            .fs_presign_object(&self.bucket, path, expires_at.unix_timestamp())
            .map_err(|err| {
                error!(error_message=%err, error_group="presign_object");
                AdapterError::read(path, &err)
            })
    }
}
