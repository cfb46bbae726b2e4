pub mod auth_forms;
pub mod error;
pub mod flash;
pub mod health;
pub mod pages;
pub mod shell;
pub mod theme;

pub use error::AppError;
