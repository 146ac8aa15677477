use std::time::Duration;

use aws_sdk_s3::{
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::put_object::builders::PutObjectFluentBuilder,
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime, DateTimeFormat},
    types::{Delete, Grant, ObjectCannedAcl, ObjectIdentifier, Permission},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::{adapters, config, model, util};

const ALL_USERS: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
const MAX_DELETE_KEYS: usize = 1000;

/// Blocking S3 client. Owns a private runtime and drives each SDK call to
/// completion before returning.
pub struct S3Client {
    client: aws_sdk_s3::Client,
    runtime: Runtime,
}

impl S3Client {
    pub fn new(client: aws_sdk_s3::Client) -> Result<Self, model::fs::FSError> {
        Ok(Self {
            client,
            runtime: util::poll::new_runtime()?,
        })
    }

    /// Loads credentials from the standard AWS provider chain and applies the
    /// region and endpoint overrides from `config`.
    pub fn from_config(config: &config::S3Config) -> Result<Self, model::fs::FSError> {
        let runtime = util::poll::new_runtime()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = util::poll::poll_until_ready(&runtime, loader.load());

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            runtime,
        })
    }

    /// Sends a put carrying the forwarded write options.
    fn send_put(
        &self,
        req: PutObjectFluentBuilder,
        body: Vec<u8>,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError> {
        let mut req = req.set_content_type(options.content_type.clone());

        if options.check_md5 {
            req = req.content_md5(content_md5(&body));
        }

        let headers = header_pairs(options);
        let req = req
            .body(ByteStream::from(body))
            .customize()
            .mutate_request(move |http_req| {
                for (name, value) in &headers {
                    if let Err(err) = http_req.headers_mut().try_insert(name.clone(), value.clone()) {
                        warn!(header = %name, error_message = %err, "dropped header");
                    }
                }
            });

        util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(())
    }
}

fn store_error<E, R>(err: SdkError<E, R>) -> model::fs::FSError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.message() {
        Some(message) => model::fs::FSError::new(message),
        None => model::fs::FSError::new(DisplayErrorContext(&err).to_string()),
    }
}

fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    timestamp.fmt(DateTimeFormat::DateTime).ok()
}

fn to_offset(position: u64) -> Result<i64, model::fs::FSError> {
    i64::try_from(position)
        .map_err(|_| model::fs::FSError::new(format!("append position out of range: {}", position)))
}

/// Base64 `Content-MD5` value for `body`.
pub fn content_md5(body: &[u8]) -> String {
    STANDARD.encode(md5::compute(body).0)
}

/// Collapses an S3 grant list into the canned ACL it corresponds to.
pub fn canned_acl_from_grants(grants: &[Grant]) -> &'static str {
    let mut read = false;
    let mut write = false;

    for grant in grants {
        if grant.grantee().and_then(|g| g.uri()) != Some(ALL_USERS) {
            continue;
        }
        match grant.permission() {
            Some(Permission::Read) => read = true,
            Some(Permission::Write) => write = true,
            Some(Permission::FullControl) => {
                read = true;
                write = true;
            }
            _ => {}
        }
    }

    match (read, write) {
        (true, true) => "public-read-write",
        (true, false) => "public-read",
        _ => "private",
    }
}

fn header_pairs(options: &model::fs::WriteOptions) -> Vec<(String, String)> {
    options
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

impl adapters::Object for S3Client {
    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError> {
        let req = self.client.head_object().bucket(bucket).key(key);

        match util::poll::poll_until_ready_error(&self.runtime, req.send()) {
            Ok(_) => Ok(true),
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                Err(store_error(err))
            }
        }
    }

    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError> {
        let req = self.client.put_object().bucket(bucket).key(key);

        self.send_put(req, body, options)
    }

    fn fs_append_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        position: u64,
        options: &model::fs::WriteOptions,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .write_offset_bytes(to_offset(position)?);

        self.send_put(req, body, options)
    }

    fn fs_get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError> {
        let req = self.client.get_object().bucket(bucket).key(key);

        util::poll::poll_until_ready_error(&self.runtime, async move {
            let o = match req.send().await {
                Ok(o) => o,
                Err(err) => {
                    let not_found = err
                        .as_service_error()
                        .map(|svc_err| svc_err.is_no_such_key())
                        .unwrap_or(false);
                    let mut fs_err = store_error(err);
                    fs_err.not_found = not_found;
                    return Err(fs_err);
                }
            };

            let bytes = o.body.collect().await.map_err(|err| {
                model::fs::FSError::new(format!("failed to collect body: {}, {}", key, err))
            })?;

            Ok(bytes.into_bytes().to_vec())
        })
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = self.client.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(())
    }

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError> {
        for chunk in keys.chunks(MAX_DELETE_KEYS) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| model::fs::FSError::new(err.to_string()))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|err| model::fs::FSError::new(err.to_string()))?;

            let req = self.client.delete_objects().bucket(bucket).delete(delete);
            let out = util::poll::poll_until_ready_error(&self.runtime, req.send())
                .map_err(store_error)?;

            if let Some(first) = out.errors().first() {
                return Err(model::fs::FSError::new(format!(
                    "failed to delete_objects at: {}, {}",
                    first.key().unwrap_or(""),
                    first.message().unwrap_or("unknown error")
                )));
            }
        }

        Ok(())
    }

    fn fs_create_object_dir(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from_static(b""));

        util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(())
    }

    fn fs_put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &str,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl));

        util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(())
    }

    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError> {
        let req = self.client.get_object_acl().bucket(bucket).key(key);

        let out =
            util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(canned_acl_from_grants(out.grants()).to_string())
    }

    fn fs_get_object_meta(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::ObjectMeta, model::fs::FSError> {
        let req = self.client.head_object().bucket(bucket).key(key);

        let ho = match util::poll::poll_until_ready_error(&self.runtime, req.send()) {
            Ok(ho) => ho,
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|svc_err| svc_err.is_not_found())
                    .unwrap_or(false);
                let mut fs_err = store_error(err);
                fs_err.not_found = not_found;
                return Err(fs_err);
            }
        };

        Ok(model::store::ObjectMeta {
            content_length: ho.content_length().map(|len| len.max(0) as u64),
            last_modified: ho.last_modified().and_then(format_timestamp),
            content_type: ho.content_type().map(str::to_string),
        })
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &model::store::ListObjectsRequest,
    ) -> Result<model::store::ListObjectsPage, model::fs::FSError> {
        let mut req = self
            .client
            .list_objects()
            .bucket(bucket)
            .prefix(&request.prefix)
            .delimiter(&request.delimiter)
            .max_keys(request.max_keys);

        if !request.marker.is_empty() {
            req = req.marker(&request.marker);
        }

        let lo =
            util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        let objects: Vec<model::store::ObjectSummary> = lo
            .contents()
            .iter()
            .map(|o| model::store::ObjectSummary {
                key: o.key().unwrap_or("").to_string(),
                size: o.size().map(|size| size.max(0) as u64).unwrap_or(0),
                last_modified: o.last_modified().and_then(format_timestamp),
            })
            .collect();

        let prefixes: Vec<String> = lo
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .map(str::to_string)
            .collect();

        let mut next_marker = lo.next_marker().unwrap_or("").to_string();
        // Without a NextMarker the last key or prefix of a truncated page resumes the listing.
        if next_marker.is_empty() && lo.is_truncated().unwrap_or(false) {
            let last_key = objects.last().map(|o| o.key.as_str()).unwrap_or("");
            let last_prefix = prefixes.last().map(String::as_str).unwrap_or("");
            next_marker = last_key.max(last_prefix).to_string();
        }

        debug!(
            prefix = %request.prefix,
            objects = objects.len(),
            prefixes = prefixes.len(),
            next_marker = %next_marker,
            "listed page"
        );

        Ok(model::store::ListObjectsPage {
            objects,
            prefixes,
            next_marker,
        })
    }

    fn fs_copy_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .client
            .copy_object()
            .copy_source(format!("{}/{}", from_bucket, urlencoding::encode(from_key)))
            .bucket(to_bucket)
            .key(to_key);

        util::poll::poll_until_ready_error(&self.runtime, req.send()).map_err(store_error)?;

        Ok(())
    }

    fn fs_presign_object(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
    ) -> Result<String, model::fs::FSError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        if expires_at <= now {
            return Err(model::fs::FSError::new(format!(
                "expiry {} is not in the future",
                expires_at
            )));
        }

        let presigning = PresigningConfig::expires_in(Duration::from_secs((expires_at - now) as u64))
            .map_err(|err| model::fs::FSError::new(err.to_string()))?;

        let req = self.client.get_object().bucket(bucket).key(key);
        let presigned = util::poll::poll_until_ready_error(&self.runtime, req.presigned(presigning))
            .map_err(store_error)?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{Grantee, Type};

    use super::*;

    fn grant(uri: &str, permission: Permission) -> Grant {
        Grant::builder()
            .grantee(Grantee::builder().r#type(Type::Group).uri(uri).build().unwrap())
            .permission(permission)
            .build()
    }

    #[test]
    fn test_canned_acl_from_grants() {
        let owner = "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

        let cases = vec![
            (vec![], "private"),
            (vec![grant(owner, Permission::FullControl)], "private"),
            (vec![grant(ALL_USERS, Permission::Read)], "public-read"),
            (
                vec![
                    grant(ALL_USERS, Permission::Read),
                    grant(ALL_USERS, Permission::Write),
                ],
                "public-read-write",
            ),
            (vec![grant(ALL_USERS, Permission::FullControl)], "public-read-write"),
        ];

        for (grants, expected) in cases {
            assert_eq!(
                canned_acl_from_grants(&grants),
                expected,
                "failed for case: {:?}",
                grants
            );
        }
    }

    #[test]
    fn test_content_md5() {
        let cases = vec![
            (&b""[..], "1B2M2Y8AsgTpgAmY7PhCfg=="),
            (&b"content"[..], "mgNkuembtIDdJeHwKEyFVQ=="),
        ];

        for (body, expected) in cases {
            assert_eq!(content_md5(body), expected, "failed for case: {:?}", body);
        }
    }

    #[test]
    fn test_format_timestamp() {
        let ts = DateTime::from_secs(1722499707);
        assert_eq!(format_timestamp(&ts).as_deref(), Some("2024-08-01T08:08:27Z"));
    }

    #[test]
    fn test_to_offset() {
        assert_eq!(to_offset(1_000_000).unwrap(), 1_000_000);
        assert!(to_offset(u64::MAX).is_err());
    }
}
