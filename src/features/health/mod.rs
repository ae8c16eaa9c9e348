pub mod handler;

pub use handler::{FontSummary, HealthResponse, health_check};
