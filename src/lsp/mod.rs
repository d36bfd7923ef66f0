//! Language adapters and request dispatch.
//!
//! - `LanguageAdapter` is the capability interface, with one implementation
//!   per embedded language (`StyleAdapter`, `ScriptAdapter`)
//! - `LanguageManager` owns the document store and routes requests
//! - `server_capabilities` describes what the server answers

mod adapter;
mod capabilities;
mod manager;
mod script;
mod style;

pub use adapter::LanguageAdapter;
pub use capabilities::{server_capabilities, TRIGGER_CHARACTERS};
pub use manager::LanguageManager;
pub use script::ScriptAdapter;
pub use style::StyleAdapter;
