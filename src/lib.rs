//! TATM - Terminal ATM Kiosk
//!
//! A terminal rendition of a bank ATM: a guarded navigation state
//! machine drives six screens, an async resolver lazily materializes
//! and caches them, and withdrawals and deposits run through a
//! pluggable transaction executor.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
