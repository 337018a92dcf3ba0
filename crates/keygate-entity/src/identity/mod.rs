//! Identity domain entities.

pub mod model;

pub use model::{CreateIdentity, Identity, IdentityProjection, normalize_email};
