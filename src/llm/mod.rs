pub mod classifier;
pub mod compose;
pub mod error;
pub mod prompts;
pub mod provider;
