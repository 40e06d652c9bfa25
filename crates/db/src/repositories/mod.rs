//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod scene_repo;
pub mod user_repo;

pub use scene_repo::SceneRepo;
pub use user_repo::UserRepo;
