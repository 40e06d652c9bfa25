//! Domain building blocks shared by every Splatforge crate.
//!
//! Nothing in here performs I/O: the modules hold the error type, id and
//! timestamp aliases, asset-kind tags, entitlement arithmetic, upload
//! validation, storage-key naming, the generation-job state tag, and the
//! billing webhook signature check.

pub mod asset_kind;
pub mod billing;
pub mod entitlement;
pub mod error;
pub mod job;
pub mod scene_name;
pub mod storage_key;
pub mod types;
pub mod upload;
