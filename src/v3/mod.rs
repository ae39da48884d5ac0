//! OpenAPI 3.0.3 dialect.

pub mod generator;
pub mod models;

pub use generator::Generator;
pub use models::OpenAPI;
