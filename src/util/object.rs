use crate::model::fs::FSError;

#[derive(Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
}

pub fn parse_provider_from_uri(bucket_uri: &str) -> Result<Provider, FSError> {
    if bucket_uri.starts_with("s3://") || !bucket_uri.contains("://") {
        Ok(Provider::AWS)
    } else {
        Err(FSError::new(format!(
            "failed to parse provider of: {}",
            bucket_uri
        )))
    }
}

/// Accepts either `s3://bucket` or a bare bucket name.
pub fn parse_bucket_from_uri(bucket_uri: &str) -> &str {
    bucket_uri
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(bucket_uri)
        .trim_end_matches('/')
}

/// Drops trailing slashes and backslashes from a directory path.
pub fn trim_directory(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
}

/// Listing prefix for a directory path: the trimmed path plus one `/`.
pub fn directory_prefix(path: &str) -> String {
    format!("{}/", trim_directory(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider_from_uri("s3://bucket"), Ok(Provider::AWS)));
        assert!(matches!(parse_provider_from_uri("bucket"), Ok(Provider::AWS)));
        assert!(matches!(parse_provider_from_uri("gs://bucket"), Err(_)));
        assert!(matches!(parse_provider_from_uri("ftp://bucket"), Err(_)));
    }

    #[test]
    fn test_parse_bucket() {
        let cases = vec![
            ("s3://bucket", "bucket"),
            ("s3://bucket/", "bucket"),
            ("bucket", "bucket"),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_bucket_from_uri(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_directory_prefix() {
        let cases = vec![
            ("foo", "foo/"),
            ("foo/", "foo/"),
            ("foo//", "foo/"),
            ("foo\\", "foo/"),
            ("foo/subfolder/", "foo/subfolder/"),
            ("", "/"),
        ];

        for (input, expected) in cases {
            assert_eq!(directory_prefix(input), expected, "failed for case: {}", input);
        }
    }
}
