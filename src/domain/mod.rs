pub mod service;

pub use service::{pattern_matches, RegisteredService, RegisteredServiceView};
