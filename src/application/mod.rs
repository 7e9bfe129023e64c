pub mod i18n;
pub mod resolver;
pub mod state;

pub use i18n::*;
pub use resolver::*;
pub use state::*;
