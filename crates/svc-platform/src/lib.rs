// Platform-neutral service vocabulary shared by the core and the adapters

pub mod control;
pub mod descriptor;
pub mod logger;
pub mod service;
pub mod work;
