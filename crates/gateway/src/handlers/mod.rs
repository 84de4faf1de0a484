//! API handlers module

pub mod chat;
pub mod fallback;
pub mod health;
pub mod pages;
