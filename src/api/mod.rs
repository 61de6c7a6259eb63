//! API module for HTTP handlers, middleware, and DTOs.
//!
//! This module provides the HTTP API layer for the application,
//! including request handlers, middleware components, and data transfer objects.

mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
