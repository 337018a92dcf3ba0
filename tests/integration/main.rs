//! Integration test harness: full-router tests over the memory backend.

mod helpers;

mod auth_flow;
mod inactivity;
mod password_reset;
mod ws;
