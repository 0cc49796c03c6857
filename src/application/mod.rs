// Feature engineering, model ensemble and the scoring service built on them.
pub mod assembler;
pub mod encoding;
pub mod ensemble;
pub mod models;
pub mod scaler;
pub mod service;
pub mod temporal;
pub mod training;
