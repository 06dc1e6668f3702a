pub mod config;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod model;
pub mod notify;
pub mod route;
pub mod session;
pub mod theme;
pub mod user;
