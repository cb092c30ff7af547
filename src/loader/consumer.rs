use crate::service::ServiceError;

/// UI-facing component waiting for the result of a load.
///
/// Loaders only ever touch a consumer from the thread that owns it, and
/// check [`Consumer::is_discarded`] right before every delivery.
pub trait Consumer<T> {
    fn set_result(&mut self, value: T);

    fn set_error(&mut self, error: &ServiceError);

    /// `true` once the component has been torn down.
    fn is_discarded(&self) -> bool;
}
