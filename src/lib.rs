pub mod card;
pub mod config;
pub mod db;
pub mod error;
pub mod fatal;
pub mod logging;
pub mod models;
pub mod nav;
pub mod ports;
pub mod report;
pub mod session;
pub mod warning;

#[cfg(test)]
pub(crate) mod testing;
