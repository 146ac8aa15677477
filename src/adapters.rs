use crate::model;

pub mod mock;
pub mod s3;

/// Blocking operations an object store client must offer. Every call is
/// scoped to the given bucket and returns the store's own failure message.
pub trait Object: Send + Sync {
    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError>;

    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError>;

    /// Appends `body` at `position`, which must equal the object's current length.
    fn fs_append_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        position: u64,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError>;

    fn fs_get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError>;

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError>;

    /// Creates a zero-byte object at exactly `key`.
    fn fs_create_object_dir(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_put_object_acl(&self, bucket: &str, key: &str, acl: &str)
        -> Result<(), model::fs::FSError>;

    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError>;

    fn fs_get_object_meta(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::ObjectMeta, model::fs::FSError>;

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &model::store::ListObjectsRequest,
    ) -> Result<model::store::ListObjectsPage, model::fs::FSError>;

    fn fs_copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), model::fs::FSError>;

    /// Signed GET URL valid until `expires_at` (Unix epoch seconds).
    fn fs_presign_object(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
    ) -> Result<String, model::fs::FSError>;
}
