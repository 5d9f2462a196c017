pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod logging;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;
