// Domain-specific error types
pub mod errors;

// Feature vocabulary and derived temporal features
pub mod features;

// Per-call scoring output
pub mod score;

// Transaction events and scoring requests
pub mod transaction;
