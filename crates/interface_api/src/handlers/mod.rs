//! Request handlers

pub mod dues;
pub mod health;
pub mod members;
