//! Read-time dashboard aggregation
//!
//! Everything here recomputes from fetched documents on every request; no
//! caching, no incremental maintenance. Ratios define divide-by-zero as 0.

use bson::oid::ObjectId;
use chrono::TimeZone;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::schemas::{AssessmentFormDoc, TaskDoc, TaskStatus};

/// Task counts for the manager view. `pending` means unassigned; `active`
/// is assigned-but-not-completed work.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub active: usize,
    pub completed: usize,
    pub pending: usize,
}

/// One entry in the manager view's critical-case list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalCase {
    pub employee_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<i32>,
    pub physically_injured: bool,
    pub can_work_as_usual: bool,
}

/// Ratio guarded against a zero denominator
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Bucket tasks into the manager view's three counters
pub fn task_status_buckets(tasks: &[TaskDoc]) -> TaskStats {
    let mut stats = TaskStats::default();
    for task in tasks {
        if task.status == TaskStatus::Completed {
            stats.completed += 1;
        } else if task.assigned_to.is_some() {
            stats.active += 1;
        } else {
            stats.pending += 1;
        }
    }
    stats
}

/// Keep only each employee's most recently submitted form. Input is
/// expected to be today's submitted forms; ties and ordering resolve by
/// submitted_at falling back to created_at.
pub fn latest_form_per_employee(forms: &[AssessmentFormDoc]) -> Vec<&AssessmentFormDoc> {
    let mut latest: HashMap<ObjectId, &AssessmentFormDoc> = HashMap::new();

    for form in forms {
        let candidate_ts = form.submitted_at.or(form.created_at);
        match latest.get(&form.employee) {
            Some(current) => {
                let current_ts = current.submitted_at.or(current.created_at);
                if candidate_ts > current_ts {
                    latest.insert(form.employee, form);
                }
            }
            None => {
                latest.insert(form.employee, form);
            }
        }
    }

    latest.into_values().collect()
}

/// Critical cases: stress level 8+ or a reported physical injury.
/// `names` maps employee ids to display names for the manager view.
pub fn critical_cases(
    forms: &[&AssessmentFormDoc],
    names: &HashMap<ObjectId, String>,
) -> Vec<CriticalCase> {
    forms
        .iter()
        .filter(|form| form.stress_level.is_some_and(|s| s >= 8) || form.physically_injured)
        .map(|form| CriticalCase {
            employee_id: form.employee.to_hex(),
            name: names.get(&form.employee).cloned().unwrap_or_default(),
            stress_level: form.stress_level,
            physically_injured: form.physically_injured,
            can_work_as_usual: form.can_work_as_usual,
        })
        .collect()
}

/// Start of the current local day (server clock) as a BSON timestamp, for
/// "submitted today" range queries.
pub fn start_of_local_day(now: chrono::DateTime<chrono::Local>) -> bson::DateTime {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time");

    let local_midnight = now
        .timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or(now);

    bson::DateTime::from_millis(local_midnight.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::FormStatus;

    fn form(employee: ObjectId, stress: Option<i32>, injured: bool, ts_millis: i64) -> AssessmentFormDoc {
        AssessmentFormDoc {
            id: Some(ObjectId::new()),
            employee,
            submitted_by: employee,
            stress_level: stress,
            physically_injured: injured,
            injury_details: None,
            spouse_available: false,
            available_hours: Some(8),
            can_work_as_usual: !injured,
            constraints: None,
            triggered: false,
            status: FormStatus::Submitted,
            reviewed_by: None,
            review_notes: None,
            submitted_at: Some(bson::DateTime::from_millis(ts_millis)),
            created_at: Some(bson::DateTime::from_millis(ts_millis)),
            updated_at: None,
        }
    }

    fn task(status: TaskStatus, assigned: bool) -> TaskDoc {
        TaskDoc {
            title: "t".into(),
            department: "family".into(),
            created_by: ObjectId::new(),
            status,
            assigned_to: assigned.then(ObjectId::new),
            ..Default::default()
        }
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
    }

    #[test]
    fn test_ratio_normal() {
        assert_eq!(ratio(1, 4), 0.25);
        assert_eq!(ratio(3, 3), 1.0);
    }

    #[test]
    fn test_task_buckets() {
        let tasks = vec![
            task(TaskStatus::Pending, false),
            task(TaskStatus::Assigned, true),
            task(TaskStatus::InProgress, true),
            task(TaskStatus::Completed, true),
            task(TaskStatus::Completed, false),
        ];
        let stats = task_status_buckets(&tasks);
        assert_eq!(stats, TaskStats { active: 2, completed: 2, pending: 1 });
    }

    #[test]
    fn test_latest_form_per_employee() {
        let alice = ObjectId::new();
        let bob = ObjectId::new();
        let forms = vec![
            form(alice, Some(3), false, 1_000),
            form(alice, Some(9), false, 2_000),
            form(bob, Some(5), false, 1_500),
        ];

        let latest = latest_form_per_employee(&forms);
        assert_eq!(latest.len(), 2);

        let alice_latest = latest.iter().find(|f| f.employee == alice).unwrap();
        assert_eq!(alice_latest.stress_level, Some(9));
    }

    #[test]
    fn test_critical_cases_threshold() {
        let stressed = ObjectId::new();
        let injured = ObjectId::new();
        let fine = ObjectId::new();
        let forms = vec![
            form(stressed, Some(8), false, 1),
            form(injured, Some(2), true, 2),
            form(fine, Some(7), false, 3),
        ];
        let refs: Vec<&AssessmentFormDoc> = forms.iter().collect();

        let mut names = HashMap::new();
        names.insert(stressed, "Stressed".to_string());
        names.insert(injured, "Injured".to_string());

        let cases = critical_cases(&refs, &names);
        assert_eq!(cases.len(), 2);
        assert!(cases.iter().any(|c| c.name == "Stressed"));
        assert!(cases.iter().any(|c| c.name == "Injured"));
        assert!(!cases.iter().any(|c| c.employee_id == fine.to_hex()));
    }

    #[test]
    fn test_start_of_local_day_is_midnight() {
        let now = chrono::Local::now();
        let start = start_of_local_day(now);
        let start_chrono = chrono::Local.timestamp_millis_opt(start.timestamp_millis()).unwrap();

        assert_eq!(start_chrono.date_naive(), now.date_naive());
        assert_eq!(start_chrono.time(), chrono::NaiveTime::MIN);
        assert!(start.timestamp_millis() <= now.timestamp_millis());
    }
}
