//! Swagger 2.0 and OpenAPI 3.0.3 documents from in-memory endpoint descriptions.
//!
//! Payload types describe themselves through [`Reflect`]; endpoints are
//! declared with [`Endpoint`] and handed to [`v2::Generator`] or
//! [`v3::Generator`], which walk the payload types into a definition table
//! and assemble the `paths` that reference it.
//!
//! ```
//! use swagdoc::{DocumentConfig, Endpoint, FieldDescriptor, Parameter, ParamType, Reflect, TypeDescriptor};
//!
//! struct Product;
//!
//! impl Reflect for Product {
//!     fn type_descriptor() -> TypeDescriptor {
//!         TypeDescriptor::structure(
//!             "models.Product",
//!             vec![FieldDescriptor::of::<u64>("ID").tag(r#"json:"id""#)],
//!         )
//!     }
//! }
//!
//! let mut generator = swagdoc::v2::Generator::new(DocumentConfig::new("Shop", "1.0"));
//! generator.add_endpoint(
//!     Endpoint::get("/product/{id}")
//!         .parameter(Parameter::path("id", ParamType::Integer))
//!         .success::<Product>(200, "the product"),
//! );
//! let json = swagdoc::export::to_json(&generator.generate()).unwrap();
//! assert!(json.contains("#/definitions/models.Product"));
//! ```

pub mod classify;
pub mod config;
pub mod definition;
pub mod endpoint;
pub mod error;
pub mod export;
pub mod expression;
pub mod model;
pub mod models;
mod property;
pub mod reflect;
pub mod response;
pub mod schema;
pub mod security;
pub mod tags;
pub mod v2;
pub mod v3;

pub use config::{DocumentConfig, GenerateOptions, RecursivePointer};
pub use definition::{DefinitionConflict, DefinitionGenerator, DefinitionTable};
pub use endpoint::{Callback, CollectionFormat, Endpoint, Link, Method, ParamType, Parameter, ResponseSpec};
pub use error::{SwagError, SwagResult};
pub use export::OutputFormat;
pub use model::{CustomResponse, Model};
pub use reflect::{FieldDescriptor, Kind, Primitive, Reflect, TypeDescriptor, WellKnown};
pub use response::ResponseGenerator;
pub use schema::{Dialect, Schema};
pub use tags::FieldTags;
