pub mod queries;
pub mod routes;

pub use queries::DealSegmentsResponse;
pub use routes::metrics_routes;
