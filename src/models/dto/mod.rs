pub mod response;

pub use response::HealthResponse;
