//! # keygate-entity
//!
//! Domain entity models for Keygate. Every struct in this crate
//! represents a store record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and store-backed
//! entities additionally derive `sqlx::FromRow`.

pub mod identity;
pub mod session;
