//! Document schemas
//!
//! Field names are camelCase on the wire to match both the stored BSON and
//! the JSON the browser client consumes.

pub mod assessment_form;
pub mod emergency_state;
pub mod emergency_task;
pub mod task;
pub mod user;

pub use assessment_form::{AssessmentFormDoc, FormStatus, ASSESSMENT_FORM_COLLECTION};
pub use emergency_state::{EmergencyStateDoc, EMERGENCY_STATE_COLLECTION};
pub use emergency_task::{EmergencyTaskDoc, EmergencyTaskStatus, EMERGENCY_TASK_COLLECTION};
pub use task::{
    Comment, Dependency, DependencyKind, HistoryEntry, Note, NoteFile, Priority, TaskDoc,
    TaskStatus, TASK_COLLECTION,
};
pub use user::{
    EmergencyContact, Preferences, UserDoc, UserRef, UserStatus, USER_COLLECTION,
};
