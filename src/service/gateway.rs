use std::sync::Arc;

use super::{DataService, ImageService, InMemoryGateway};

/// Handles to the remote services, shared with worker threads.
#[derive(Clone)]
pub struct Gateway {
    image: Arc<dyn ImageService>,
    data: Arc<dyn DataService>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(image: Arc<dyn ImageService>, data: Arc<dyn DataService>) -> Self {
        Self { image, data }
    }

    pub fn in_memory(gateway: Arc<InMemoryGateway>) -> Self {
        Self {
            image: gateway.clone(),
            data: gateway,
        }
    }

    pub fn image_service(&self) -> &dyn ImageService {
        self.image.as_ref()
    }

    pub fn data_service(&self) -> &dyn DataService {
        self.data.as_ref()
    }
}
