use serde::Serialize;

/// Lifecycle of a load request: `Idle -> InFlight -> {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    InFlight,
    Completed,
    Cancelled,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Completed | LoadState::Cancelled)
    }
}

/// Why a result was dropped instead of delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    Cancelled,
    ConsumerDiscarded,
    NotInFlight,
}
