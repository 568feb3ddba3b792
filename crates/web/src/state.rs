use std::sync::Arc;

use engine::{AggregationFacade, PgRepository};

/// Shared by every handler; the facade itself holds no per-request state.
pub type AppState = Arc<AggregationFacade<PgRepository>>;
