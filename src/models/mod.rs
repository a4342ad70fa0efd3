pub mod auth;
pub mod task;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use task::*;
pub use user::*;
