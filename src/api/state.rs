use std::sync::Arc;

use crate::services::{MetadataProvider, Recommender};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

/// Read-only after startup
pub struct AppStateInner {
    pub recommender: Recommender,
    /// `None` when no metadata provider is configured
    pub metadata: Option<Arc<dyn MetadataProvider>>,
}

impl AppState {
    pub fn new(recommender: Recommender, metadata: Option<Arc<dyn MetadataProvider>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                recommender,
                metadata,
            }),
        }
    }

    pub fn recommender(&self) -> &Recommender {
        &self.inner.recommender
    }

    pub fn metadata(&self) -> Option<&Arc<dyn MetadataProvider>> {
        self.inner.metadata.as_ref()
    }
}
