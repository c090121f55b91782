pub mod services;
pub mod views;

pub use services::{delete_registered_service, get_services, update_evaluation_order};
pub use views::{authorization_failure, logout, manage};
