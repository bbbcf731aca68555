//! System-level operations.

use std::time::Duration;

/// System operations trait.
pub trait SystemOps {
    /// Fixed pause giving freshly created device-mapper nodes time to become usable.
    ///
    /// This is a plain delay, not a readiness poll.
    fn settle(&self, delay: Duration);
}
