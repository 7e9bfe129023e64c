pub mod api;
pub mod bank;

pub use api::*;
pub use bank::*;
