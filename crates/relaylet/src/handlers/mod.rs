//! HTTP request handlers for the daemon endpoint.

pub mod containers;
pub mod health;
pub mod pods;
