pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod jid;
pub mod platform;
pub mod webhook;

#[cfg(test)]
mod testing;
