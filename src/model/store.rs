/// Parameters of a single prefix/delimiter page request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub max_keys: i32,
    pub prefix: String,
    pub delimiter: String,
    pub marker: String,
}

/// One object as reported in a listing page. `last_modified` is the store's
/// own timestamp string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

/// One page of a listing. An empty `next_marker` means there are no more pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsPage {
    pub objects: Vec<ObjectSummary>,
    pub prefixes: Vec<String>,
    pub next_marker: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}
