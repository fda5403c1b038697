//! Homefront - workforce task and emergency coordination API
//!
//! REST service for municipal workforce coordination: managers create and
//! assign tasks, employees report availability through assessment forms,
//! and a global emergency mode activates a fixed catalog of priority tasks.
//!
//! ## Services
//!
//! - **Tasks**: task CRUD with per-field audit history, assignment, notes
//! - **Emergency**: global on/off switch over a seeded task catalog
//! - **Assessment**: employee self-assessment forms and manager broadcasts
//! - **Dashboard**: read-time aggregation for manager and employee views

pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod routes;
pub mod server;

pub use config::Args;
pub use error::{HomefrontError, Result};
pub use server::{run, AppState};
