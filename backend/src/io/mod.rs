//! # IO Layer
//!
//! Interfaces exposing the domain to the outside world. For now that is the
//! JSON REST API served by axum.

pub mod rest;

pub use rest::*;
