mod call;
mod calls;
mod consumer;
mod error;
mod executor;
mod handle;
mod request;
mod state;


pub use call::LoadCall;
pub use calls::{
    ContainerCountCall, ContainerCounts, HierarchyCall, RenderPlaneCall, RenderingControlCall,
    RenderingSettingsCall, SettingsAction, ThumbnailCall, ThumbnailSetCall,
};
pub use consumer::Consumer;
pub use error::{LoaderError, Result};
pub use executor::{CallExecutor, Completion, PendingCall};
pub use handle::{CallHandle, CallId, CancelToken};
pub use request::{AsyncLoadRequest, Delivery};
pub use state::{LoadState, StaleReason};
