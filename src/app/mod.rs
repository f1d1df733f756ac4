pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{notification_router, orchestrator_router};
