pub mod task_repo;
pub mod user_repo;

pub use task_repo::{HttpTaskRepository, TaskRepository};
pub use user_repo::{HttpUserRepository, UserRepository};
