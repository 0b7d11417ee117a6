use std::sync::Arc;

use bodega_catalog::store::CatalogStore;
use bodega_order::workflow::OrderWorkflow;

/// Shared handler state. Stores are injected at construction so the same
/// router runs against Postgres in the binary and in-memory stores in
/// tests.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub workflow: Arc<OrderWorkflow>,
}
