//! # Adapters
//!
//! Adapters for the platform's remote Web API.

pub mod web;

pub use web::WebApiTokenVerifier;
