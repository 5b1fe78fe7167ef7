pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod session;

#[cfg(test)]
mod testing;
