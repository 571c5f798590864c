//! GraphQL surface: schema roots, object types and the per-request context.

pub mod context;
pub mod loaders;
pub mod schema;
pub mod types;

pub use context::RequestContext;
pub use loaders::Loaders;
pub use schema::{build_schema, AppSchema, MutationRoot, QueryRoot};
