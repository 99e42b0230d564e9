//! HTML front end: routes, handlers, templates and embedded assets

pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod static_files;
pub mod templates;

pub use error::AppError;
pub use handlers::AppState;
pub use routes::create_router;
