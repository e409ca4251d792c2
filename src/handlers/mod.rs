// Main handlers (system/health handlers)
pub mod main_handlers;
pub use main_handlers::AppState;

// User handlers module
pub mod user_handlers;

// Survey handlers module
pub mod survey_handlers;

// Response submission and analytics handlers
pub mod response_handlers;
