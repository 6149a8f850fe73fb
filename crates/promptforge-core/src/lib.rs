pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod relay;
pub mod template;
pub mod types;
