pub mod css;
pub mod script;
