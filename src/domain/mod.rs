pub mod api;
pub mod context;
pub mod errors;
pub mod models;
pub mod navigation;

pub use api::*;
pub use context::*;
pub use errors::*;
pub use models::*;
pub use navigation::*;
