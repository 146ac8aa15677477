//! Lazy, depth-first listing of a directory over a flat key namespace.
//!
//! Pages are pulled from the client one at a time, only when the caller asks
//! for an entry the already fetched pages cannot supply. Each page emits its
//! common prefixes first (each one followed by its full expansion when the
//! listing is deep), then its objects.

use std::{collections::VecDeque, iter::FusedIterator};

use tracing::{debug, error};

use crate::{
    adapters,
    error::AdapterError,
    model::{
        fs::Entry,
        store::{ListObjectsRequest, ObjectSummary},
    },
    util,
};

pub const MAX_KEYS: i32 = 1000;
pub const DELIMITER: &str = "/";

/// Listing state of one directory prefix.
struct Frame {
    prefix: String,
    marker: String,
    exhausted: bool,
    prefixes: VecDeque<String>,
    objects: VecDeque<ObjectSummary>,
}

impl Frame {
    fn new(path: &str) -> Self {
        Self {
            prefix: util::object::directory_prefix(path),
            marker: String::new(),
            exhausted: false,
            prefixes: VecDeque::new(),
            objects: VecDeque::new(),
        }
    }

    fn request(&self) -> ListObjectsRequest {
        ListObjectsRequest {
            max_keys: MAX_KEYS,
            prefix: self.prefix.clone(),
            delimiter: DELIMITER.to_string(),
            marker: self.marker.clone(),
        }
    }

    fn is_placeholder(&self, object: &ObjectSummary) -> bool {
        object.size == 0 && object.key == self.prefix
    }
}

/// Iterator over the entries below a directory. A failed page request is
/// yielded once as an error and ends the listing.
pub struct ListContents<'a> {
    client: &'a dyn adapters::Object,
    bucket: &'a str,
    deep: bool,
    stack: Vec<Frame>,
}

impl<'a> ListContents<'a> {
    pub fn new(client: &'a dyn adapters::Object, bucket: &'a str, path: &str, deep: bool) -> Self {
        Self {
            client,
            bucket,
            deep,
            stack: vec![Frame::new(path)],
        }
    }
}

impl Iterator for ListContents<'_> {
    type Item = Result<Entry, AdapterError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;

            if let Some(prefix) = frame.prefixes.pop_front() {
                if self.deep {
                    self.stack.push(Frame::new(&prefix));
                }
                return Some(Ok(Entry::Directory { path: prefix }));
            }

            if let Some(object) = frame.objects.pop_front() {
                if frame.is_placeholder(&object) {
                    continue;
                }
                return Some(Ok(Entry::File {
                    last_modified: util::time::parse_optional_timestamp(
                        object.last_modified.as_deref(),
                    ),
                    path: object.key,
                    size: object.size,
                }));
            }

            if frame.exhausted {
                self.stack.pop();
                continue;
            }

            let request = frame.request();
            debug!(prefix = %request.prefix, marker = %request.marker, "fetching page");

            match self.client.fs_list_objects(self.bucket, &request) {
                Ok(page) => {
                    frame.exhausted = page.next_marker.is_empty();
                    frame.marker = page.next_marker;
                    frame.prefixes = page.prefixes.into();
                    frame.objects = page.objects.into();
                }
                Err(err) => {
                    error!(error_message=%err, error_group="list_objects", prefix=%frame.prefix);
                    let err = AdapterError::list_contents(&frame.prefix, &err);
                    self.stack.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl FusedIterator for ListContents<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{Call, MockClient, Op};
    use crate::error::ErrorKind;

    const TIMESTAMP: i64 = 1722499707;

    fn dir(path: &str) -> Entry {
        Entry::Directory {
            path: path.to_string(),
        }
    }

    fn file(path: &str, size: u64) -> Entry {
        Entry::File {
            path: path.to_string(),
            last_modified: Some(TIMESTAMP),
            size,
        }
    }

    fn tree() -> MockClient {
        let client = MockClient::new("bucket");
        client.insert_object("foo/", b"");
        client.insert_object("foo/bar.md", &[b'a'; 1024]);
        client.insert_object("foo/boo.md", &[b'b'; 1024]);
        client.insert_object("foo/subfolder/", b"");
        client.insert_object("foo/subfolder/sub_file.md", &[b'c'; 1024]);
        client
    }

    fn list_requests(client: &MockClient) -> Vec<ListObjectsRequest> {
        client
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_deep_listing_order() {
        let client = tree();

        let entries: Vec<Entry> = ListContents::new(&client, "bucket", "foo/", true)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            entries,
            vec![
                dir("foo/subfolder/"),
                file("foo/subfolder/sub_file.md", 1024),
                file("foo/bar.md", 1024),
                file("foo/boo.md", 1024),
            ]
        );

        let requests = list_requests(&client);
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0],
            ListObjectsRequest {
                max_keys: 1000,
                prefix: "foo/".to_string(),
                delimiter: "/".to_string(),
                marker: "".to_string(),
            }
        );
        assert_eq!(requests[1].prefix, "foo/subfolder/");
    }

    #[test]
    fn test_shallow_listing_does_not_descend() {
        let client = tree();

        let entries: Vec<Entry> = ListContents::new(&client, "bucket", "foo", false)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            entries,
            vec![
                dir("foo/subfolder/"),
                file("foo/bar.md", 1024),
                file("foo/boo.md", 1024),
            ]
        );
        assert_eq!(list_requests(&client).len(), 1);
    }

    #[test]
    fn test_empty_and_absent_directories() {
        let client = tree();
        client.insert_object("empty/", b"");

        let cases = vec!["empty", "empty/", "missing", "foo/bar.md"];

        for path in cases {
            let entries: Vec<_> = ListContents::new(&client, "bucket", path, true).collect();
            assert!(entries.is_empty(), "failed for case: {}", path);
        }
    }

    #[test]
    fn test_nested_tree_across_pages() {
        let client = MockClient::new("bucket").with_page_size(1);
        client.insert_object("root/", b"");
        client.insert_object("root/a/", b"");
        client.insert_object("root/a/b/", b"");
        client.insert_object("root/a/b/leaf.txt", b"leaf");
        client.insert_object("root/a/one.txt", b"1");
        client.insert_object("root/c/two.txt", b"22");
        client.insert_object("root/three.txt", b"333");

        let entries: Vec<Entry> = ListContents::new(&client, "bucket", "root", true)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            entries,
            vec![
                dir("root/a/"),
                dir("root/a/b/"),
                file("root/a/b/leaf.txt", 4),
                file("root/a/one.txt", 1),
                dir("root/c/"),
                file("root/c/two.txt", 2),
                file("root/three.txt", 3),
            ]
        );

        let files: Vec<&Entry> = entries.iter().filter(|e| e.is_file()).collect();
        assert_eq!(files.len(), 4);
        assert!(list_requests(&client).iter().any(|r| !r.marker.is_empty()));
    }

    #[test]
    fn test_listing_is_lazy() {
        let client = tree();

        let mut listing = ListContents::new(&client, "bucket", "foo", true);
        assert!(client.calls().is_empty());

        assert_eq!(listing.next().unwrap().unwrap(), dir("foo/subfolder/"));
        assert_eq!(list_requests(&client).len(), 1);

        assert_eq!(
            listing.next().unwrap().unwrap(),
            file("foo/subfolder/sub_file.md", 1024)
        );
        assert_eq!(list_requests(&client).len(), 2);
    }

    #[test]
    fn test_failed_page_ends_listing() {
        let client = tree();
        client.fail(Op::List, "The specified bucket does not exist.");

        let mut listing = ListContents::new(&client, "bucket", "foo", true);

        let err = listing.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ListContents);
        assert_eq!(err.location(), "foo/");
        assert_eq!(err.reason(), "The specified bucket does not exist.");
        assert!(listing.next().is_none());
        assert!(listing.next().is_none());
    }

    #[test]
    fn test_only_the_directory_itself_is_a_placeholder() {
        let client = tree();
        client.insert_object("foo/empty.txt", b"");

        let entries: Vec<Entry> = ListContents::new(&client, "bucket", "foo", false)
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(entries.contains(&file("foo/empty.txt", 0)));
        assert!(!entries.iter().any(|e| e.path() == "foo/"));
    }
}
