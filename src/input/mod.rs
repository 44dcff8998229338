//! Global hotkey registration and listening

pub mod backend;
pub mod listener;
pub mod x11_backend;
