//! Client handle binding a transport to a trace observer.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::config::{ClientConfig, ConfigResult};
use crate::reqwest_transport::ReqwestTransport;
use crate::trace::{TraceObserver, TracingObserver};
use crate::transport::Transport;

/// Entry point for every GoCD API call.
///
/// The dispatcher and its method wrappers live in [`crate::action`]. The
/// client holds no per-call state, so it can be cloned freely and shared
/// between tasks whenever the transport allows it.
#[derive(Clone)]
pub struct Client<T = ReqwestTransport> {
    pub(crate) transport: T,
    pub(crate) observer: Arc<dyn TraceObserver>,
}

impl Client<ReqwestTransport> {
    /// Build a client with the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when validation fails.
    pub fn from_config(config: &ClientConfig) -> ConfigResult<Self> {
        Ok(Self::new(ReqwestTransport::from_config(config)?))
    }
}

impl<T: Transport> Client<T> {
    /// Wrap `transport`, tracing through [`TracingObserver`].
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the trace observer.
    #[must_use]
    pub fn with_observer(self, observer: impl TraceObserver + 'static) -> Self {
        self.with_shared_observer(Arc::new(observer))
    }

    /// Replace the trace observer with one shared elsewhere.
    #[must_use]
    pub fn with_shared_observer(mut self, observer: Arc<dyn TraceObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Debug> Debug for Client<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Client")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
