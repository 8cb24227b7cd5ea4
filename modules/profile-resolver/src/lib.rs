pub mod activity;
pub mod adapters;
pub mod config;
pub mod error;
pub mod payload;
pub mod ports;
pub mod resolver;
pub mod response;
pub mod store;

#[cfg(feature = "test-support")]
pub mod testing;

pub use activity::{decompose, CategoryVocabulary, Decomposition};
pub use adapters::{BrightDataProvider, MemoryServerCache};
pub use config::ResolverConfig;
pub use error::{CacheError, NormalizationError, ProviderError, ResolveError};
pub use payload::{normalize, RawPayload};
pub use ports::{CachedEntry, PayloadSource, ProfileCache, ProfileProvider, WriteOutcome};
pub use resolver::{Resolution, Resolver};
pub use response::{format_profile, ResponseEnvelope};
pub use store::InMemoryCache;
