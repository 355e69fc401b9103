use crate::Result;
use std::fmt;

type Canceller = Box<dyn FnOnce() -> Result<()> + Send>;

/// Handle to a registered wallet event listener.
///
/// The listener is removed when the handle is unsubscribed or dropped,
/// whichever comes first. Cancellation runs at most once.
pub struct Subscription {
    topic: String,
    canceller: Option<Canceller>,
}

impl Subscription {
    /// Creates a handle that runs `cancel` to remove the listener
    pub fn new<F>(topic: impl Into<String>, cancel: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            topic: topic.into(),
            canceller: Some(Box::new(cancel)),
        }
    }

    /// The event topic this handle listens to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// True until the listener has been removed
    pub fn is_active(&self) -> bool {
        self.canceller.is_some()
    }

    /// Removes the listener, reporting a failure to do so
    pub fn unsubscribe(mut self) -> Result<()> {
        match self.canceller.take() {
            Some(cancel) => cancel(),
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.canceller.take() {
            if let Err(e) = cancel() {
                tracing::debug!(topic = %self.topic, error = %e, "dropping subscription failed");
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
