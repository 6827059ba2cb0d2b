pub mod collector;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod finalize;
pub mod navigator;
pub mod output;
pub mod progress;
pub mod scout;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use config::{Credentials, ScoutConfig};
pub use error::{Result, ScoutError};
pub use scout::{ScrapeReport, Scout};
pub use types::{Post, PostRecord};
