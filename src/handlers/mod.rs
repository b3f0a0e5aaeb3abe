pub mod course_handler;
pub mod health_handler;

pub use course_handler::upload_course;
pub use health_handler::health_check;
