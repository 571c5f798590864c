pub mod graphql;
pub mod health;
pub mod metrics;

pub use graphql::{graphql_handler, graphql_playground};
pub use health::health_check;
pub use metrics::metrics;
