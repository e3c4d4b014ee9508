pub mod bounds;
pub mod latlng;
pub mod mercator;
pub mod precision;

// Geo crate: small, well-tested coordinate primitives only.
pub use bounds::*;
pub use latlng::*;
pub use mercator::*;
pub use precision::*;
