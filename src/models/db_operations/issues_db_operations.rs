use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::DbError;
use crate::models::{FeedbackEntry, Issue, IssueStatus};

pub const ISSUES: TableDefinition<&[u8; 16], &str> = TableDefinition::new("issues");
/// Newest-first listing index: (negated creation timestamp, issue id).
pub const ISSUE_CHRONOLOGICAL_INDEX: TableDefinition<(i64, &[u8; 16]), ()> =
    TableDefinition::new("issue_chronological_index");
/// Per-project filtering index: (project id, negated timestamp, issue id).
pub const ISSUE_PROJECT_INDEX: TableDefinition<(&[u8; 16], i64, &[u8; 16]), ()> =
    TableDefinition::new("issue_project_index");

pub fn insert_issue(db: &Database, issue: &Issue) -> Result<(), DbError> {
    let issue_json = serde_json::to_string(issue)?;
    let issue_id_bytes = issue.id.into_bytes();
    let timestamp = -issue.created_at.timestamp();

    let write_txn = db.begin_write()?;
    {
        let mut issues_table = write_txn.open_table(ISSUES)?;
        let mut chrono_index = write_txn.open_table(ISSUE_CHRONOLOGICAL_INDEX)?;
        let mut project_index = write_txn.open_table(ISSUE_PROJECT_INDEX)?;

        issues_table.insert(&issue_id_bytes, issue_json.as_str())?;
        chrono_index.insert((timestamp, &issue_id_bytes), ())?;

        if let Some(project_id) = issue.project {
            let project_id_bytes = project_id.into_bytes();
            project_index.insert((&project_id_bytes, timestamp, &issue_id_bytes), ())?;
        }
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_issue(db: &Database, id: &Uuid) -> Result<Option<Issue>, DbError> {
    let issue_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let issues_table = read_txn.open_table(ISSUES)?;

    let result = match issues_table.get(&issue_id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn list_issues_newest_first(db: &Database) -> Result<Vec<Issue>, DbError> {
    let read_txn = db.begin_read()?;
    let chrono_index = read_txn.open_table(ISSUE_CHRONOLOGICAL_INDEX)?;
    let issues_table = read_txn.open_table(ISSUES)?;

    let issues = chrono_index
        .iter()?
        .filter_map(|item_result| {
            item_result.ok().and_then(|(key, _value)| {
                let issue_id_bytes = key.value().1;
                issues_table
                    .get(issue_id_bytes)
                    .ok()
                    .flatten()
                    .and_then(|issue_json| serde_json::from_str(issue_json.value()).ok())
            })
        })
        .collect();
    Ok(issues)
}

pub fn list_issues_by_project(db: &Database, project_id: &Uuid) -> Result<Vec<Issue>, DbError> {
    let read_txn = db.begin_read()?;
    let project_index = read_txn.open_table(ISSUE_PROJECT_INDEX)?;
    let issues_table = read_txn.open_table(ISSUES)?;

    let project_id_bytes = project_id.into_bytes();
    let start_key = (&project_id_bytes, i64::MIN, &[0u8; 16]);
    let end_key = (&project_id_bytes, i64::MAX, &[255u8; 16]);

    let issues = project_index
        .range(start_key..=end_key)?
        .filter_map(|item_result| {
            item_result.ok().and_then(|(key, _value)| {
                let issue_id_bytes = key.value().2;
                issues_table
                    .get(issue_id_bytes)
                    .ok()
                    .flatten()
                    .and_then(|issue_json| serde_json::from_str(issue_json.value()).ok())
            })
        })
        .collect();
    Ok(issues)
}

/// Overwrites the status field. The enum constraint is the only guard; any
/// status may follow any other.
pub fn update_issue_status(
    db: &Database,
    id: &Uuid,
    status: IssueStatus,
) -> Result<Issue, DbError> {
    let issue_id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut issues_table = write_txn.open_table(ISSUES)?;

        let mut issue: Issue = {
            let guard = issues_table
                .get(&issue_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Issue {} not found", id)))?;
            serde_json::from_str(guard.value())?
        };

        issue.status = status;
        let issue_json = serde_json::to_string(&issue)?;
        issues_table.insert(&issue_id_bytes, issue_json.as_str())?;
        issue
    };
    write_txn.commit()?;
    Ok(updated)
}

/// Appends a timestamped public-feedback entry. The creation timestamp is
/// untouched, so the issue keeps its place in the chronological indexes.
pub fn append_issue_feedback(
    db: &Database,
    id: &Uuid,
    user: &str,
    comment: &str,
) -> Result<Issue, DbError> {
    let issue_id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut issues_table = write_txn.open_table(ISSUES)?;

        let mut issue: Issue = {
            let guard = issues_table
                .get(&issue_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Issue {} not found", id)))?;
            serde_json::from_str(guard.value())?
        };

        issue.public_feedback.push(FeedbackEntry {
            user: user.to_string(),
            comment: comment.to_string(),
            date: Utc::now(),
        });
        let issue_json = serde_json::to_string(&issue)?;
        issues_table.insert(&issue_id_bytes, issue_json.as_str())?;
        issue
    };
    write_txn.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    use crate::setup::db_setup;

    fn open_store(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("documents.db")).unwrap();
        db_setup::setup_documents_db(&db).unwrap();
        db
    }

    fn sample_issue(title: &str, project: Option<Uuid>) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "deep".to_string(),
            department: "Public Works".to_string(),
            location: "Main St".to_string(),
            status: IssueStatus::default(),
            attachment: None,
            project,
            project_name: project.map(|_| "Road Repair".to_string()),
            public_feedback: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let project_id = Uuid::new_v4();
        let mut issue = sample_issue("Pothole", Some(project_id));
        issue.attachment = Some("/uploads/pothole.jpg".to_string());
        insert_issue(&db, &issue).unwrap();

        let fetched = read_issue(&db, &issue.id).unwrap().unwrap();
        assert_eq!(fetched.status, IssueStatus::Pending);
        assert_eq!(fetched.attachment.as_deref(), Some("/uploads/pothole.jpg"));
        assert_eq!(fetched.project, Some(project_id));
        assert_eq!(fetched.project_name.as_deref(), Some("Road Repair"));
    }

    #[test]
    fn listings_are_newest_first() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let mut older = sample_issue("Older", None);
        older.created_at = Utc::now() - Duration::hours(2);
        let newer = sample_issue("Newer", None);

        insert_issue(&db, &older).unwrap();
        insert_issue(&db, &newer).unwrap();

        let listed = list_issues_newest_first(&db).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Newer");
        assert_eq!(listed[1].title, "Older");
    }

    #[test]
    fn project_filter_only_returns_linked_issues() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let project_id = Uuid::new_v4();
        insert_issue(&db, &sample_issue("Linked", Some(project_id))).unwrap();
        insert_issue(&db, &sample_issue("Unlinked", None)).unwrap();
        insert_issue(&db, &sample_issue("Other project", Some(Uuid::new_v4()))).unwrap();

        let listed = list_issues_by_project(&db, &project_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Linked");
    }

    #[test]
    fn status_update_on_missing_issue_is_not_found() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let result = update_issue_status(&db, &Uuid::new_v4(), IssueStatus::Resolved);
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn feedback_appends_are_ordered_and_timestamped() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let issue = sample_issue("Pothole", None);
        insert_issue(&db, &issue).unwrap();

        append_issue_feedback(&db, &issue.id, "resident1", "Still open").unwrap();
        let updated = append_issue_feedback(&db, &issue.id, "resident2", "Getting worse").unwrap();

        assert_eq!(updated.public_feedback.len(), 2);
        assert_eq!(updated.public_feedback[0].user, "resident1");
        assert_eq!(updated.public_feedback[1].comment, "Getting worse");
    }
}
