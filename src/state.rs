use std::sync::Arc;
use std::time::Duration;

use crate::allocator::{AllocatorConfig, CodeAllocator};
use crate::error::LinkError;
use crate::store::LinkStore;

/// Application state shared across all request handlers
///
/// The store is injected here instead of living in a global, so tests can build as
/// many isolated instances as they need.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub allocator: CodeAllocator,
    /// Time budget for allocating one short code
    pub allocation_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LinkStore>,
        config: AllocatorConfig,
        allocation_timeout: Duration,
    ) -> Result<Self, LinkError> {
        let allocator = CodeAllocator::new(Arc::clone(&store), config)?;
        Ok(Self {
            store,
            allocator,
            allocation_timeout,
        })
    }
}
