pub mod architecture;
pub mod config;
pub mod run;

pub use config::TrainingConfig;
pub use run::{Hyperparameters, RunSummary, train_model};
