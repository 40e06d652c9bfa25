//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching the table and the
//! input DTOs its repository accepts.

pub mod scene;
pub mod user;
