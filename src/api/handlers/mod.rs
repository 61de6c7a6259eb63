//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod agents;
pub mod calls;
pub mod health;
pub mod pacing;
pub mod queues;
