//! Core domain types shared across the Astroneko workspace.
//!
//! This crate provides the strongly-typed identifiers used by the
//! session and role-authorization crates.

pub mod id;

pub use id::UserId;
