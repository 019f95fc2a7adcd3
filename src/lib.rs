pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod search;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{ResearchError, Result};
pub use generator::outlet::render_markdown;
pub use generator::workflow::launch;
