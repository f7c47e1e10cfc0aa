//! Studio admin: content administration API for the portfolio and
//! innovation-studio site.
//!
//! ARCHITECTURE
//! ============
//! - `views`: list presentation (table, grid, kanban, canvas), the view
//!   switcher and its persisted preference, and the per-view error boundary.
//! - `services`: validation and persistence for each content type, canvas
//!   block sync, the block linker, and AI assistance.
//! - `routes`: the JSON HTTP surface over both.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
