//! Session domain entities.

pub mod kind;
pub mod model;
pub mod platform;

pub use kind::TokenKind;
pub use model::{CreateSession, SessionRecord};
pub use platform::Platform;
