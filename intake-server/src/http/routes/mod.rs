//! Route handlers organized by resource

pub mod contacts;
pub mod diagnostics;
pub mod health;
pub mod root;
