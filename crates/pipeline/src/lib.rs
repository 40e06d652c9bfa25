//! Generation flow and owner-scoped scene access.
//!
//! - [`Orchestrator`] runs one generation request end to end: quota check,
//!   input validation, storage, inference, scene record, counter increment.
//! - [`QuotaTracker`] derives entitlements and never grants access when the
//!   counters cannot be read.
//! - [`SceneLibrary`] enforces that scenes owned by someone else look
//!   exactly like scenes that do not exist.

pub mod error;
pub mod library;
pub mod orchestrator;
pub mod quota;

pub use error::{GenerationError, LibraryError};
pub use library::SceneLibrary;
pub use orchestrator::{GeneratedImage, GenerationOutcome, ImageUpload, Orchestrator};
pub use quota::QuotaTracker;
