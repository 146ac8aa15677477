use std::fmt;

use thiserror::Error;

use crate::model::fs::FSError;

/// Which attribute a failed metadata query was after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataType {
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataType::Visibility => "visibility",
            MetadataType::MimeType => "mime_type",
            MetadataType::LastModified => "last_modified",
            MetadataType::FileSize => "file_size",
        };
        f.write_str(name)
    }
}

/// What failed, without the details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Write,
    Read,
    Delete,
    Move,
    Copy,
    SetVisibility,
    CreateDirectory,
    Metadata,
    CheckExistence,
    ListContents,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unable to write file at location: {location}. {reason}")]
    UnableToWriteFile { location: String, reason: String },

    #[error("unable to read file from location: {location}. {reason}")]
    UnableToReadFile { location: String, reason: String },

    #[error("unable to delete file located at: {location}. {reason}")]
    UnableToDeleteFile { location: String, reason: String },

    #[error("unable to move file from {from} to {to}. {reason}")]
    UnableToMoveFile {
        from: String,
        to: String,
        reason: String,
    },

    #[error("unable to copy file from {from} to {to}. {reason}")]
    UnableToCopyFile {
        from: String,
        to: String,
        reason: String,
    },

    #[error("unable to set visibility for file {location}. {reason}")]
    UnableToSetVisibility { location: String, reason: String },

    #[error("unable to create a directory at {location}. {reason}")]
    UnableToCreateDirectory { location: String, reason: String },

    #[error("unable to retrieve the {metadata_type} for file at location: {location}. {reason}")]
    UnableToRetrieveMetadata {
        location: String,
        metadata_type: MetadataType,
        reason: String,
    },

    #[error("unable to check existence for: {location}. {reason}")]
    UnableToCheckExistence { location: String, reason: String },

    #[error("unable to list contents for '{location}'. {reason}")]
    UnableToListContents { location: String, reason: String },

    #[error("invalid input for {location}. {reason}")]
    InvalidInput { location: String, reason: String },
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl AdapterError {
    pub fn write(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToWriteFile {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn read(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToReadFile {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn delete(location: &str, reason: impl Into<String>) -> Self {
        AdapterError::UnableToDeleteFile {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    pub fn move_file(from: &str, to: &str, err: &FSError) -> Self {
        AdapterError::UnableToMoveFile {
            from: from.to_string(),
            to: to.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn copy_file(from: &str, to: &str, err: &FSError) -> Self {
        AdapterError::UnableToCopyFile {
            from: from.to_string(),
            to: to.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn set_visibility(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToSetVisibility {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn create_directory(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToCreateDirectory {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn metadata(location: &str, metadata_type: MetadataType, err: &FSError) -> Self {
        AdapterError::UnableToRetrieveMetadata {
            location: location.to_string(),
            metadata_type,
            reason: err.message.clone(),
        }
    }

    pub fn check_existence(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToCheckExistence {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn list_contents(location: &str, err: &FSError) -> Self {
        AdapterError::UnableToListContents {
            location: location.to_string(),
            reason: err.message.clone(),
        }
    }

    pub fn invalid_input(location: &str, reason: impl Into<String>) -> Self {
        AdapterError::InvalidInput {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::UnableToWriteFile { .. } => ErrorKind::Write,
            AdapterError::UnableToReadFile { .. } => ErrorKind::Read,
            AdapterError::UnableToDeleteFile { .. } => ErrorKind::Delete,
            AdapterError::UnableToMoveFile { .. } => ErrorKind::Move,
            AdapterError::UnableToCopyFile { .. } => ErrorKind::Copy,
            AdapterError::UnableToSetVisibility { .. } => ErrorKind::SetVisibility,
            AdapterError::UnableToCreateDirectory { .. } => ErrorKind::CreateDirectory,
            AdapterError::UnableToRetrieveMetadata { .. } => ErrorKind::Metadata,
            AdapterError::UnableToCheckExistence { .. } => ErrorKind::CheckExistence,
            AdapterError::UnableToListContents { .. } => ErrorKind::ListContents,
            AdapterError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// Primary location of the failure; the source for move and copy.
    pub fn location(&self) -> &str {
        match self {
            AdapterError::UnableToMoveFile { from, .. }
            | AdapterError::UnableToCopyFile { from, .. } => from,
            AdapterError::UnableToWriteFile { location, .. }
            | AdapterError::UnableToReadFile { location, .. }
            | AdapterError::UnableToDeleteFile { location, .. }
            | AdapterError::UnableToSetVisibility { location, .. }
            | AdapterError::UnableToCreateDirectory { location, .. }
            | AdapterError::UnableToRetrieveMetadata { location, .. }
            | AdapterError::UnableToCheckExistence { location, .. }
            | AdapterError::UnableToListContents { location, .. }
            | AdapterError::InvalidInput { location, .. } => location,
        }
    }

    /// Destination of a failed move or copy.
    pub fn destination(&self) -> Option<&str> {
        match self {
            AdapterError::UnableToMoveFile { to, .. }
            | AdapterError::UnableToCopyFile { to, .. } => Some(to),
            _ => None,
        }
    }

    /// The store's message, verbatim.
    pub fn reason(&self) -> &str {
        match self {
            AdapterError::UnableToWriteFile { reason, .. }
            | AdapterError::UnableToReadFile { reason, .. }
            | AdapterError::UnableToDeleteFile { reason, .. }
            | AdapterError::UnableToMoveFile { reason, .. }
            | AdapterError::UnableToCopyFile { reason, .. }
            | AdapterError::UnableToSetVisibility { reason, .. }
            | AdapterError::UnableToCreateDirectory { reason, .. }
            | AdapterError::UnableToRetrieveMetadata { reason, .. }
            | AdapterError::UnableToCheckExistence { reason, .. }
            | AdapterError::UnableToListContents { reason, .. }
            | AdapterError::InvalidInput { reason, .. } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "The specified bucket does not exist.";

    #[test]
    fn test_kind_and_fields() {
        let err = FSError::new(MESSAGE);

        let cases = vec![
            (AdapterError::write("foo/bar.md", &err), ErrorKind::Write),
            (AdapterError::read("foo/bar.md", &err), ErrorKind::Read),
            (AdapterError::delete("foo/bar.md", MESSAGE), ErrorKind::Delete),
            (AdapterError::set_visibility("foo/bar.md", &err), ErrorKind::SetVisibility),
            (AdapterError::create_directory("foo/bar.md", &err), ErrorKind::CreateDirectory),
            (
                AdapterError::metadata("foo/bar.md", MetadataType::MimeType, &err),
                ErrorKind::Metadata,
            ),
            (AdapterError::check_existence("foo/bar.md", &err), ErrorKind::CheckExistence),
            (AdapterError::list_contents("foo/bar.md", &err), ErrorKind::ListContents),
            (AdapterError::invalid_input("foo/bar.md", MESSAGE), ErrorKind::InvalidInput),
        ];

        for (error, expected) in cases {
            assert_eq!(error.kind(), expected, "failed on kind for case: {}", error);
            assert_eq!(error.location(), "foo/bar.md", "failed on location for case: {}", error);
            assert_eq!(error.reason(), MESSAGE, "failed on reason for case: {}", error);
            assert!(error.to_string().contains(MESSAGE), "failed on display for case: {}", error);
            assert_eq!(error.destination(), None);
        }
    }

    #[test]
    fn test_move_and_copy_carry_both_locations() {
        let err = FSError::new(MESSAGE);

        let moved = AdapterError::move_file("foo/boo.md", "foo/new_boo.md", &err);
        assert_eq!(moved.kind(), ErrorKind::Move);
        assert_eq!(moved.location(), "foo/boo.md");
        assert_eq!(moved.destination(), Some("foo/new_boo.md"));
        assert_eq!(moved.reason(), MESSAGE);

        let copied = AdapterError::copy_file("foo/boo.md", "foo/copy.md", &err);
        assert_eq!(copied.kind(), ErrorKind::Copy);
        assert_eq!(copied.destination(), Some("foo/copy.md"));
        assert_eq!(
            copied.to_string(),
            format!("unable to copy file from foo/boo.md to foo/copy.md. {}", MESSAGE)
        );
    }

    #[test]
    fn test_metadata_display_names_the_attribute() {
        let err = AdapterError::metadata("a.txt", MetadataType::Visibility, &FSError::new("denied"));
        assert_eq!(
            err.to_string(),
            "unable to retrieve the visibility for file at location: a.txt. denied"
        );
    }
}
