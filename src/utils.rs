//! Utility modules: developer log capture and logger configuration.
pub mod devlog;
pub mod logger;
