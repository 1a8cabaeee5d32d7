pub mod normalizer;

pub use normalizer::{normalize_invocation, RunOutput};
