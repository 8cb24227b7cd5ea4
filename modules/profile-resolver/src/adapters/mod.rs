pub mod brightdata;
pub mod memory;

pub use brightdata::BrightDataProvider;
pub use memory::MemoryServerCache;
