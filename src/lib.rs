//! A file-backed FIFO message broker with bounded-retry producers and
//! poll-until-delivered consumers.

pub mod config;
pub mod consumer;
pub mod controller;
pub mod error;
pub mod message_handler;
pub mod policy;
pub mod producer;
pub mod server;
pub mod transport;

pub use error::{Error, Result};
