pub mod common;
pub mod draft;
pub mod open;
pub mod submit;
pub mod sweep;
