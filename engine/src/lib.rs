// Engine library root
// Declares the modules for the contract auto-calc engine crate.

pub mod calc;
pub mod config;
pub mod data;
pub mod error;
pub mod events;

pub use calc::CalcEngine;
pub use config::CalcSettings;
pub use error::EngineError;
