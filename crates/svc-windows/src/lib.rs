// Windows platform implementations

pub mod elevation;
pub mod sc;

#[cfg(target_os = "windows")]
pub mod dispatch;

#[cfg(target_os = "windows")]
pub mod service;
