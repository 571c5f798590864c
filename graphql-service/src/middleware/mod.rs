pub mod claims;
pub mod locale;

pub use claims::{claims_middleware, BearerToken};
pub use locale::locale_middleware;
