//! Application error types and conversions.

mod app_error;
mod database_converter;

pub use app_error::{AppError, AppResult};
pub use database_converter::convert_diesel_error;
