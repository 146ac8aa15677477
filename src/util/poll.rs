use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::model::fs::FSError;

/// Builds the private runtime a blocking client drives its SDK futures on.
pub fn new_runtime() -> Result<Runtime, FSError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| FSError::new(format!("failed to build runtime, {}", err)))
}

pub fn poll_until_ready_error<Fut, T, E>(runtime: &Runtime, future: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    runtime.block_on(future)
}

pub fn poll_until_ready<Fut, T>(runtime: &Runtime, future: Fut) -> T
where
    Fut: Future<Output = T>,
{
    runtime.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_until_ready() {
        let runtime = new_runtime().unwrap();

        assert_eq!(poll_until_ready(&runtime, async { 7 }), 7);

        let result: Result<u8, String> =
            poll_until_ready_error(&runtime, async { Err("boom".to_string()) });
        assert_eq!(result, Err("boom".to_string()));
    }
}
