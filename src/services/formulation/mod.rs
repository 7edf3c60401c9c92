mod errors;
mod models;
mod service;

pub use errors::Error;
pub use models::{Alternative, DietEntry, Recommendation};
pub use service::{EvaluateOptions, RecommendOptions, Service, ServiceBuilder};
