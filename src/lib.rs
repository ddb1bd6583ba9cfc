pub mod config;
pub mod demos;
pub mod logging;
pub mod notifications;
