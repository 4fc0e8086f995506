//! # Middleware
//!
//! Request metrics recorded through the `metrics` facade. Authentication
//! lives in [`crate::auth`].

pub mod metrics;
