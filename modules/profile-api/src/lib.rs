pub mod config;
pub mod routes;

use std::sync::Arc;

use profile_resolver::{ProfileCache, Resolver};

pub use config::AppConfig;
pub use routes::build_router;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    /// Same cache the resolver uses; checked by `/health`.
    pub cache: Arc<dyn ProfileCache>,
}
