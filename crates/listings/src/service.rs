use geo::GeoBounds;
use serde::{Deserialize, Serialize};

use crate::filters::FilterSet;
use crate::listing::Listing;

/// One page request against the remote listing data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub bounds: Option<GeoBounds>,
    #[serde(default)]
    pub filters: FilterSet,
}

fn default_page_size() -> u32 {
    20
}

impl FetchRequest {
    pub fn page_one(bounds: Option<GeoBounds>, filters: FilterSet) -> Self {
        Self {
            page: 1,
            page_size: default_page_size(),
            bounds,
            filters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub items: Vec<Listing>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport-level failure (timeout, connection refused, 5xx).
    Unavailable(String),
    /// The service answered but the payload could not be used.
    BadResponse(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Unavailable(msg) => write!(f, "listing service unavailable: {msg}"),
            ServiceError::BadResponse(msg) => write!(f, "bad listing service response: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// The remote data service, as seen by this engine.
///
/// Implementations run the transport however they like; results are handed
/// back through the session so delivery order is the caller's business
/// (late responses for superseded requests get discarded there).
pub trait ListingService {
    fn fetch(&mut self, req: &FetchRequest) -> Result<FetchResponse, ServiceError>;
}
