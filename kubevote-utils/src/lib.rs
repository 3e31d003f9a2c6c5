//! Shared ambient stack for the kubevote binaries: lock aliases, env-var
//! configuration helpers and tracing setup.

pub mod config;
pub mod locks;
pub mod logging;
