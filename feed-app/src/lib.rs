pub mod app;
pub mod background;
pub mod bootstrap;
pub mod config;
pub mod notification;
pub mod shutdown;

pub use bootstrap::{init_foundation, start_feed, start_http_feed, Feed};
