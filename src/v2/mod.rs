//! Swagger 2.0 dialect.

pub mod generator;
pub mod models;

pub use generator::Generator;
pub use models::Swagger;
