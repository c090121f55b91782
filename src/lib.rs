pub mod admin;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;
