//! Transport boundary.
//!
//! A [`Runner`] sends a compiled [`OperationDef`] to the store and hands back
//! the raw response. The compiler never performs I/O itself; network clients,
//! retries and credentials live behind this trait.
//!
//! The trait uses `#[async_trait]` so runners can be shared as
//! `Arc<dyn Runner>`.

use std::sync::Arc;

use dynaql_model::{OperationDef, RawResponse};

/// Executes compiled operations.
#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    /// Send `operation` and return the undecoded response.
    async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse>;
}

#[async_trait::async_trait]
impl<R: Runner + ?Sized> Runner for Arc<R> {
    async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
        (**self).run(operation).await
    }
}

#[async_trait::async_trait]
impl<R: Runner + ?Sized> Runner for &R {
    async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
        (**self).run(operation).await
    }
}

#[cfg(test)]
mod tests {
    use dynaql_model::OperationKind;
    use dynaql_model::input::GetItemInput;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<OperationKind>>,
    }

    #[async_trait::async_trait]
    impl Runner for Recorder {
        async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
            self.seen.lock().push(operation.kind());
            Ok(RawResponse::default())
        }
    }

    #[tokio::test]
    async fn test_should_dispatch_through_shared_runner() {
        let recorder = Arc::new(Recorder::default());
        let shared: Arc<dyn Runner> = recorder.clone();
        let op = OperationDef::GetItem(GetItemInput::default());

        shared.run(&op).await.unwrap();
        (&*recorder).run(&op).await.unwrap();

        assert_eq!(
            *recorder.seen.lock(),
            [OperationKind::GetItem, OperationKind::GetItem]
        );
    }
}
