pub mod generate;
pub mod health;

pub use generate::{generate_image, preflight};
pub use health::{health_check, readiness_check};
