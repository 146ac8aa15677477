use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

use crate::{adapters, model};

/// Timestamp stamped on every object the mock stores.
pub const MOCK_TIMESTAMP: &str = "2024-08-01T08:08:27.000Z";
pub const NO_SUCH_BUCKET: &str = "The specified bucket does not exist.";
pub const NO_SUCH_KEY: &str = "The specified key does not exist.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    Put,
    Append,
    Get,
    Delete,
    DeleteMany,
    CreateDir,
    PutAcl,
    GetAcl,
    GetMeta,
    List,
    Copy,
    Presign,
}

/// A client call as the mock received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Exists { key: String },
    Put { key: String, body: Vec<u8>, options: model::fs::WriteOptions },
    Append { key: String, len: usize, position: u64 },
    Get { key: String },
    Delete { key: String },
    DeleteMany { keys: Vec<String> },
    CreateDir { key: String },
    PutAcl { key: String, acl: String },
    GetAcl { key: String },
    GetMeta { key: String },
    List(model::store::ListObjectsRequest),
    Copy { from: String, to: String },
    Presign { key: String, expires_at: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockObject {
    pub body: Vec<u8>,
    pub acl: String,
    pub content_type: Option<String>,
    pub last_modified: String,
}

impl MockObject {
    fn new(body: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            body,
            acl: "private".to_string(),
            content_type,
            last_modified: MOCK_TIMESTAMP.to_string(),
        }
    }
}

/// In-memory single-bucket store. Listing honors prefix, delimiter, marker and
/// max-keys; appends must land at the object's current length. Any operation
/// can be made to fail with a chosen message.
pub struct MockClient {
    bucket: String,
    page_size: Option<usize>,
    objects: Mutex<BTreeMap<String, MockObject>>,
    failures: Mutex<HashMap<Op, String>>,
    calls: Mutex<Vec<Call>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockClient {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            page_size: None,
            objects: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Caps every listing page below the requested max-keys.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn insert_object(&self, key: &str, body: &[u8]) {
        lock(&self.objects).insert(key.to_string(), MockObject::new(body.to_vec(), None));
    }

    pub fn insert_object_with_type(&self, key: &str, body: &[u8], content_type: &str) {
        lock(&self.objects).insert(
            key.to_string(),
            MockObject::new(body.to_vec(), Some(content_type.to_string())),
        );
    }

    pub fn object(&self, key: &str) -> Option<MockObject> {
        lock(&self.objects).get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn fail(&self, op: Op, message: &str) {
        lock(&self.failures).insert(op, message.to_string());
    }

    pub fn clear_failure(&self, op: Op) {
        lock(&self.failures).remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, bucket: &str, op: Op, call: Call) -> Result<(), model::fs::FSError> {
        lock(&self.calls).push(call);

        if bucket != self.bucket {
            return Err(model::fs::FSError::new(NO_SUCH_BUCKET));
        }

        match lock(&self.failures).get(&op) {
            Some(message) => Err(model::fs::FSError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn list_page(&self, request: &model::store::ListObjectsRequest) -> model::store::ListObjectsPage {
        let objects = lock(&self.objects);
        let limit = match self.page_size {
            Some(size) => size.min(request.max_keys.max(0) as usize),
            None => request.max_keys.max(0) as usize,
        };
        let prefix = request.prefix.as_str();
        let delimiter = request.delimiter.as_str();
        let marker = request.marker.as_str();
        // A marker naming a common prefix of this listing skips everything under it.
        let skip_under_marker = !delimiter.is_empty()
            && marker.len() > prefix.len()
            && marker.starts_with(prefix)
            && marker.ends_with(delimiter);

        let mut page = model::store::ListObjectsPage::default();
        let mut last = String::new();
        let mut count = 0;
        let mut truncated = false;

        for (key, object) in objects.iter() {
            if !key.starts_with(prefix) || key.as_str() <= marker {
                continue;
            }
            if skip_under_marker && key.starts_with(marker) {
                continue;
            }

            let rest = &key[prefix.len()..];
            let common = if delimiter.is_empty() {
                None
            } else {
                rest.find(delimiter)
                    .map(|pos| format!("{}{}", prefix, &rest[..pos + delimiter.len()]))
            };

            if let Some(common) = common {
                if page.prefixes.last() == Some(&common) {
                    continue;
                }
                if count == limit {
                    truncated = true;
                    break;
                }
                page.prefixes.push(common.clone());
                last = common;
            } else {
                if count == limit {
                    truncated = true;
                    break;
                }
                page.objects.push(model::store::ObjectSummary {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    last_modified: Some(object.last_modified.clone()),
                });
                last = key.clone();
            }
            count += 1;
        }

        if truncated {
            page.next_marker = last;
        }

        page
    }
}

impl adapters::Object for MockClient {
    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError> {
        self.record(bucket, Op::Exists, Call::Exists { key: key.to_string() })?;
        Ok(lock(&self.objects).contains_key(key))
    }

    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError> {
        self.record(
            bucket,
            Op::Put,
            Call::Put {
                key: key.to_string(),
                body: body.clone(),
                options: options.clone(),
            },
        )?;
        lock(&self.objects).insert(
            key.to_string(),
            MockObject::new(body, options.content_type.clone()),
        );
        Ok(())
    }

    fn fs_append_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        position: u64,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError> {
        self.record(
            bucket,
            Op::Append,
            Call::Append {
                key: key.to_string(),
                len: body.len(),
                position,
            },
        )?;

        let mut objects = lock(&self.objects);
        let current = objects.get(key).map(|o| o.body.len() as u64).unwrap_or(0);
        if current != position {
            return Err(model::fs::FSError::new(format!(
                "Position is not equal to file length, position: {}, length: {}",
                position, current
            )));
        }

        objects
            .entry(key.to_string())
            .or_insert_with(|| MockObject::new(Vec::new(), options.content_type.clone()))
            .body
            .extend_from_slice(&body);
        Ok(())
    }

    fn fs_get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError> {
        self.record(bucket, Op::Get, Call::Get { key: key.to_string() })?;
        lock(&self.objects)
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| model::fs::FSError::not_found(NO_SUCH_KEY))
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.record(bucket, Op::Delete, Call::Delete { key: key.to_string() })?;
        lock(&self.objects).remove(key);
        Ok(())
    }

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError> {
        self.record(bucket, Op::DeleteMany, Call::DeleteMany { keys: keys.to_vec() })?;
        let mut objects = lock(&self.objects);
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn fs_create_object_dir(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.record(bucket, Op::CreateDir, Call::CreateDir { key: key.to_string() })?;
        lock(&self.objects).insert(key.to_string(), MockObject::new(Vec::new(), None));
        Ok(())
    }

    fn fs_put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &str,
    ) -> Result<(), model::fs::FSError> {
        self.record(
            bucket,
            Op::PutAcl,
            Call::PutAcl {
                key: key.to_string(),
                acl: acl.to_string(),
            },
        )?;
        match lock(&self.objects).get_mut(key) {
            Some(object) => {
                object.acl = acl.to_string();
                Ok(())
            }
            None => Err(model::fs::FSError::not_found(NO_SUCH_KEY)),
        }
    }

    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError> {
        self.record(bucket, Op::GetAcl, Call::GetAcl { key: key.to_string() })?;
        lock(&self.objects)
            .get(key)
            .map(|o| o.acl.clone())
            .ok_or_else(|| model::fs::FSError::not_found(NO_SUCH_KEY))
    }

    fn fs_get_object_meta(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::ObjectMeta, model::fs::FSError> {
        self.record(bucket, Op::GetMeta, Call::GetMeta { key: key.to_string() })?;
        lock(&self.objects)
            .get(key)
            .map(|o| model::store::ObjectMeta {
                content_length: Some(o.body.len() as u64),
                last_modified: Some(o.last_modified.clone()),
                content_type: o.content_type.clone(),
            })
            .ok_or_else(|| model::fs::FSError::not_found(NO_SUCH_KEY))
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &model::store::ListObjectsRequest,
    ) -> Result<model::store::ListObjectsPage, model::fs::FSError> {
        self.record(bucket, Op::List, Call::List(request.clone()))?;
        Ok(self.list_page(request))
    }

    fn fs_copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), model::fs::FSError> {
        self.record(
            from_bucket,
            Op::Copy,
            Call::Copy {
                from: from_key.to_string(),
                to: to_key.to_string(),
            },
        )?;
        if to_bucket != self.bucket {
            return Err(model::fs::FSError::new(NO_SUCH_BUCKET));
        }

        let mut objects = lock(&self.objects);
        let object = objects
            .get(from_key)
            .cloned()
            .ok_or_else(|| model::fs::FSError::not_found(NO_SUCH_KEY))?;
        objects.insert(to_key.to_string(), object);
        Ok(())
    }

    fn fs_presign_object(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
    ) -> Result<String, model::fs::FSError> {
        self.record(
            bucket,
            Op::Presign,
            Call::Presign {
                key: key.to_string(),
                expires_at,
            },
        )?;
        Ok(format!(
            "https://{}.mock.local/{}?Expires={}",
            bucket, key, expires_at
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Object;
    use crate::model::store::ListObjectsRequest;

    fn request(prefix: &str, marker: &str) -> ListObjectsRequest {
        ListObjectsRequest {
            max_keys: 1000,
            prefix: prefix.to_string(),
            delimiter: "/".to_string(),
            marker: marker.to_string(),
        }
    }

    fn seeded() -> MockClient {
        let client = MockClient::new("bucket");
        client.insert_object("foo/", b"");
        client.insert_object("foo/bar.md", b"bar");
        client.insert_object("foo/boo.md", b"boo");
        client.insert_object("foo/subfolder/", b"");
        client.insert_object("foo/subfolder/sub_file.md", b"sub");
        client.insert_object("other.md", b"other");
        client
    }

    #[test]
    fn test_list_groups_common_prefixes() {
        let client = seeded();

        let page = client.fs_list_objects("bucket", &request("foo/", "")).unwrap();

        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["foo/", "foo/bar.md", "foo/boo.md"]);
        assert_eq!(page.prefixes, vec!["foo/subfolder/".to_string()]);
        assert_eq!(page.next_marker, "");
    }

    #[test]
    fn test_list_paginates_with_marker() {
        let client = seeded().with_page_size(2);

        let first = client.fs_list_objects("bucket", &request("foo/", "")).unwrap();
        assert_eq!(first.objects.len(), 2);
        assert_eq!(first.next_marker, "foo/bar.md");

        let second = client
            .fs_list_objects("bucket", &request("foo/", &first.next_marker))
            .unwrap();
        let keys: Vec<&str> = second.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["foo/boo.md"]);
        assert_eq!(second.prefixes, vec!["foo/subfolder/".to_string()]);
        assert_eq!(second.next_marker, "");
    }

    #[test]
    fn test_list_marker_on_common_prefix_skips_its_keys() {
        let client = MockClient::new("bucket").with_page_size(1);
        client.insert_object("a/x/1", b"1");
        client.insert_object("a/x/2", b"2");
        client.insert_object("a/y", b"y");

        let first = client.fs_list_objects("bucket", &request("a/", "")).unwrap();
        assert_eq!(first.prefixes, vec!["a/x/".to_string()]);
        assert_eq!(first.next_marker, "a/x/");

        let second = client
            .fs_list_objects("bucket", &request("a/", &first.next_marker))
            .unwrap();
        assert!(second.prefixes.is_empty());
        assert_eq!(second.objects[0].key, "a/y");
    }

    #[test]
    fn test_append_requires_current_length() {
        let client = MockClient::new("bucket");
        let options = model::fs::WriteOptions::default();

        client
            .fs_append_object("bucket", "log", b"abc".to_vec(), 0, &options)
            .unwrap();
        client
            .fs_append_object("bucket", "log", b"def".to_vec(), 3, &options)
            .unwrap();
        assert!(client
            .fs_append_object("bucket", "log", b"ghi".to_vec(), 2, &options)
            .is_err());

        assert_eq!(client.object("log").unwrap().body, b"abcdef".to_vec());
    }

    #[test]
    fn test_wrong_bucket_and_injected_failures() {
        let client = seeded();

        let err = client.fs_get_object("other-bucket", "foo/bar.md").unwrap_err();
        assert_eq!(err.message, NO_SUCH_BUCKET);

        client.fail(Op::Get, "boom");
        assert_eq!(client.fs_get_object("bucket", "foo/bar.md").unwrap_err().message, "boom");

        client.clear_failure(Op::Get);
        assert_eq!(client.fs_get_object("bucket", "foo/bar.md").unwrap(), b"bar".to_vec());
        assert!(client.fs_get_object("bucket", "missing").unwrap_err().not_found);

        assert_eq!(client.calls().len(), 4);
    }
}
