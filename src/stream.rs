use std::io::Read;

use tracing::{debug, error};

use crate::{
    adapters,
    error::{AdapterError, AdapterResult},
    model::fs::WriteOptions,
};

pub const CHUNK_SIZE: usize = 1_000_000;

/// Appends `source` to `path` in `CHUNK_SIZE` pieces, chunk `i` at offset
/// `i * CHUNK_SIZE`. Stops at the first failure; whatever was appended stays.
/// An empty source still appends once, creating an empty object.
pub fn append_chunks(
    client: &dyn adapters::Object,
    bucket: &str,
    path: &str,
    source: &mut dyn Read,
    options: &WriteOptions,
) -> AdapterResult<u64> {
    let mut index: u64 = 0;
    let mut written: u64 = 0;

    loop {
        let mut chunk = Vec::with_capacity(CHUNK_SIZE);
        if let Err(err) = (&mut *source).take(CHUNK_SIZE as u64).read_to_end(&mut chunk) {
            error!(error_message=%err, error_group="read_source", chunk=index);
            if index == 0 && chunk.is_empty() {
                return Err(AdapterError::invalid_input(
                    path,
                    format!("the contents is not a readable stream, {}", err),
                ));
            }
            return Err(AdapterError::UnableToWriteFile {
                location: path.to_string(),
                reason: format!("failed to read chunk {}, {}", index, err),
            });
        }

        if chunk.is_empty() && index > 0 {
            break;
        }

        let len = chunk.len();
        let position = index * CHUNK_SIZE as u64;
        debug!(chunk = index, position = position, size = len, "appending");

        client
            .fs_append_object(bucket, path, chunk, position, options)
            .map_err(|err| {
                error!(error_message=%err, error_group="append_object", position=position);
                AdapterError::write(path, &err)
            })?;

        written += len as u64;
        index += 1;

        if len < CHUNK_SIZE {
            break;
        }
    }

    Ok(written)
}
