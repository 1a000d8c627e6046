//! Core traits, layered settings, and the module registry shared by every
//! catalog crate.

pub mod health;
pub mod module;
pub mod registry;
pub mod settings;

pub use health::HealthCheck;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
