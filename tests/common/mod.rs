//! Common test utilities and helpers
//!
//! - Binary path resolution (`helpers::get_binary`)
//! - Scripted `CMake` runner and fixtures (`helpers`)

pub(crate) mod helpers;
