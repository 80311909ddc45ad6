//! Library exports for the shortlink service
//!
//! This module exposes internal components for testing and potential library usage.

pub mod allocator;
pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod state;
pub mod store;
