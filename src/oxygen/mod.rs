//! Oxygen supply calculator.
//!
//! Gas cylinder and liquid oxygen duration, transport tank recommendation
//! and minute ventilation, exposed as JSON endpoints and a calculator page.

mod calculators;
mod models;
mod page;
mod routes;
mod services;
mod validator;

pub use models::ValidationErrorResponse;
pub use page::{show, submit};
pub use routes::router;
pub use validator::ValidationError;
