use crate::service::{Gateway, Result};

/// One remote call, built from the load target.
pub trait LoadCall: Send + 'static {
    type Output: Send + 'static;

    fn description(&self) -> String;

    /// Runs on a worker thread and must issue exactly one remote call.
    fn execute(self, gateway: &Gateway) -> Result<Self::Output>;
}
