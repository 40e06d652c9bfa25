pub mod auth;
pub mod billing;
pub mod generation;
pub mod scenes;
