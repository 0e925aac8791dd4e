// Public modules
pub mod ci;
pub mod config;
pub mod deploy;
pub mod error;
pub mod prompt;
pub mod resolver;
pub mod ssh;
pub mod stage;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Hint, Result};
pub use resolver::{ArtifactChooser, ResolvedRelease, Resolver};
