//! Fixed emergency-task catalog
//!
//! Seeded once at startup when the collection is empty. Catalog tasks are
//! never created through the API; emergency activation only flips their
//! `is_active` gate.

use tracing::info;

use crate::db::schemas::{EmergencyTaskDoc, Priority, EMERGENCY_TASK_COLLECTION};
use crate::db::MongoClient;
use crate::error::HomefrontError;

fn catalog_task(
    title: &str,
    description: &str,
    criticality: Priority,
    department: &str,
    required_skills: &[&str],
    estimated_time: i32,
) -> EmergencyTaskDoc {
    EmergencyTaskDoc {
        title: title.to_string(),
        description: description.to_string(),
        criticality,
        department: department.to_string(),
        required_skills: required_skills.iter().map(|s| s.to_string()).collect(),
        estimated_time,
        ..Default::default()
    }
}

/// The full seeded catalog: eleven tasks across five departments
pub fn emergency_task_catalog() -> Vec<EmergencyTaskDoc> {
    vec![
        // Family department
        catalog_task(
            "מיפוי צרכים טלפוני",
            "יצירת קשר טלפוני עם משפחות לזיהוי צרכים מיידיים וארוכי טווח במצב החירום",
            Priority::High,
            "family",
            &["תקשורת בינאישית", "הערכת מצב"],
            120,
        ),
        catalog_task(
            "ביקורי בית למשפחות",
            "ביקור פיזי במשפחות שזוהו כזקוקות לתמיכה מיוחדת והערכת מצבן בשטח",
            Priority::Critical,
            "family",
            &["עבודה סוציאלית", "הערכת מצב"],
            180,
        ),
        // Special needs department
        catalog_task(
            "איתור צרכים בשיחת טלפון יזומה",
            "יצירת קשר יזום עם אנשים בעלי צרכים מיוחדים לבדיקת מצבם וצורכיהם",
            Priority::High,
            "special needs",
            &["תקשורת מותאמת", "הכרת צרכים מיוחדים"],
            90,
        ),
        catalog_task(
            "הפעלת מוקד לאוכלוסייה מיוחדת",
            "הפעלת מוקד ייעודי למתן מענה מותאם לאוכלוסייה עם צרכים מיוחדים",
            Priority::Critical,
            "special needs",
            &["ניהול מוקד", "הכרת צרכים מיוחדים"],
            480,
        ),
        catalog_task(
            "וידוא חדרים נגישים באזורי פינוי",
            "הבטחת זמינות מקומות מתאימים ונגישים עבור אנשים עם מוגבלויות באזורי פינוי",
            Priority::High,
            "special needs",
            &["נגישות", "לוגיסטיקה"],
            240,
        ),
        // Senior citizens department
        catalog_task(
            "יצירת קשר עם אזרחים ותיקים",
            "בדיקה טלפונית של מצב ואיתור צרכים של אזרחים ותיקים",
            Priority::High,
            "senior citizens",
            &["תקשורת עם קשישים", "הערכת מצב"],
            120,
        ),
        catalog_task(
            "ביקורי בית לקשישים",
            "ביקור פיזי אצל אזרחים ותיקים לבדיקת מצבם ומתן סיוע במידת הצורך",
            Priority::Critical,
            "senior citizens",
            &["טיפול בקשישים", "עזרה ראשונה"],
            180,
        ),
        // Sturdiness department
        catalog_task(
            "ריכוז פניות למרכז חוסן",
            "ניהול ותיאום הפניות למרכז החוסן וחיבור לגורמי טיפול מתאימים",
            Priority::High,
            "sturdiness",
            &["ניהול פניות", "תיאום טיפול"],
            480,
        ),
        // Community department
        catalog_task(
            "הפעלת מועדוניות",
            "ארגון והפעלת מסגרות פעילות קהילתיות בהתאם למצב ולהנחיות",
            Priority::Medium,
            "community",
            &["הפעלת קבוצות", "ניהול פעילות"],
            300,
        ),
        catalog_task(
            "תפעול צח״י עירוני",
            "ניהול וריכוז פעילות צוות החירום היישובי ועדכון תמונת המצב השוטפת",
            Priority::Critical,
            "community",
            &["ניהול חירום", "תיאום צוותים"],
            480,
        ),
        catalog_task(
            "הפעלת תכנית מרגישים בבית",
            "ארגון פעילויות קהילתיות תומכות ליצירת תחושת שייכות וביטחון",
            Priority::Medium,
            "community",
            &["הנחיית קבוצות", "פיתוח קהילתי"],
            240,
        ),
    ]
}

/// Seed the catalog if the collection is empty
pub async fn seed_emergency_tasks(mongo: &MongoClient) -> Result<(), HomefrontError> {
    let collection = mongo
        .collection::<EmergencyTaskDoc>(EMERGENCY_TASK_COLLECTION)
        .await?;

    let existing = collection.count(bson::doc! {}).await?;
    if existing > 0 {
        info!("Emergency task catalog already seeded ({} tasks)", existing);
        return Ok(());
    }

    let catalog = emergency_task_catalog();
    let inserted = collection.insert_many(catalog).await?;
    info!("Seeded {} emergency catalog tasks", inserted);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_size_and_departments() {
        let catalog = emergency_task_catalog();
        assert_eq!(catalog.len(), 11);

        let departments: std::collections::HashSet<&str> =
            catalog.iter().map(|t| t.department.as_str()).collect();
        assert_eq!(departments.len(), 5);
    }

    #[test]
    fn test_catalog_tasks_start_inactive_and_unassigned() {
        for task in emergency_task_catalog() {
            assert!(!task.is_active);
            assert!(task.assigned_to.is_none());
            assert!(task.estimated_time > 0);
            assert!(!task.title.is_empty());
        }
    }
}
