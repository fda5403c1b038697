//! Domain logic shared by the route handlers
//!
//! History diffing, dashboard math, and form bounds are pure functions
//! over fetched documents, testable without a running store. Catalog
//! seeding is the one exception; it writes through the Mongo client at
//! startup.

pub mod assessment;
pub mod catalog;
pub mod dashboard;
pub mod history;

pub use assessment::validate_submission;
pub use catalog::emergency_task_catalog;
pub use dashboard::{
    critical_cases, latest_form_per_employee, ratio, start_of_local_day, task_status_buckets,
    CriticalCase, TaskStats,
};
pub use history::diff_fields;
