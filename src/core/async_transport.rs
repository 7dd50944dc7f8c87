//! Async transport trait and a blocking bridge for the uploader thread

use super::error::Result;
use async_trait::async_trait;

/// Trait for transports built on an async HTTP client
///
/// # Example
///
/// ```no_run
/// use agent_logger::core::{AsyncRemoteLogTransport, Result};
/// use async_trait::async_trait;
///
/// struct MyHttpTransport;
///
/// #[async_trait]
/// impl AsyncRemoteLogTransport for MyHttpTransport {
///     async fn send(
///         &self,
///         payload: &[u8],
///         ingest_key: &str,
///         entity_guid: &str,
///         url: &str,
///     ) -> Result<()> {
///         // POST `payload` to `url` with the ingest key header
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncRemoteLogTransport: Send + Sync {
    async fn send(&self, payload: &[u8], ingest_key: &str, entity_guid: &str, url: &str)
        -> Result<()>;
}

#[cfg(feature = "async-transport")]
pub use bridge::TokioTransport;

#[cfg(feature = "async-transport")]
mod bridge {
    use super::AsyncRemoteLogTransport;
    use crate::core::error::{LoggerError, Result};
    use crate::core::transport::RemoteLogTransport;
    use tokio::runtime::Handle;

    /// Runs an [`AsyncRemoteLogTransport`] on a tokio runtime from the
    /// logger's uploader thread, which is not itself inside the runtime.
    pub struct TokioTransport<T> {
        inner: T,
        handle: Handle,
    }

    impl<T: AsyncRemoteLogTransport> TokioTransport<T> {
        pub fn new(inner: T, handle: Handle) -> Self {
            Self { inner, handle }
        }

        /// Bind to the runtime of the calling context
        pub fn current(inner: T) -> Result<Self> {
            let handle = Handle::try_current()
                .map_err(|e| LoggerError::config("TokioTransport", e.to_string()))?;
            Ok(Self::new(inner, handle))
        }
    }

    impl<T: AsyncRemoteLogTransport> RemoteLogTransport for TokioTransport<T> {
        fn send(
            &self,
            payload: &[u8],
            ingest_key: &str,
            entity_guid: &str,
            url: &str,
        ) -> Result<()> {
            self.handle
                .block_on(self.inner.send(payload, ingest_key, entity_guid, url))
        }
    }
}
