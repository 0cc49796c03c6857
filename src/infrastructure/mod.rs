// Artifact bundle persistence
pub mod bundle;

// Per-user transaction history collaborator
pub mod history;
