pub mod error;
pub mod events;
pub mod fanout;
pub mod relay;
pub mod server;
