//! Authentication primitives.
//!
//! - [`identity`] -- Verification of identity-provider ID tokens on sign-in.
//! - [`jwt`] -- Access-token generation and validation.

pub mod identity;
pub mod jwt;
