//! Book catalog application library.
//!
//! Holds the catalog modules registered with the kernel at startup.

pub mod modules;

pub use modules::*;
