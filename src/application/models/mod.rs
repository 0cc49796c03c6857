// Sub-model interface
pub mod scorer;

// Supervised classifier (smartcore random forest)
pub mod forest;

// Unsupervised isolation-forest anomaly model
pub mod isolation;

// Unsupervised reconstruction anomaly model
pub mod reconstruction;

pub use forest::{ForestClassifier, ForestParams};
pub use isolation::{IsolationForestModel, IsolationParams};
pub use reconstruction::{ReconstructionModel, ReconstructionParams};
pub use scorer::ModelScorer;
