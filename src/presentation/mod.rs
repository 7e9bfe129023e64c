pub mod input;
pub mod screens;
pub mod ui;

pub use input::*;
pub use screens::*;
pub use ui::*;
