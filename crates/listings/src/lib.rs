pub mod fetch;
pub mod filters;
pub mod listing;
pub mod query;
pub mod service;
pub mod store;

pub use fetch::*;
pub use filters::*;
pub use listing::*;
pub use query::*;
pub use service::*;
pub use store::*;
