pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod state;

pub use config::ServiceConfig;
pub use models::{ModelSet, ModelSlot};
pub use routes::router;
pub use state::AppState;
