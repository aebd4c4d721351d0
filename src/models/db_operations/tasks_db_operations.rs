use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::workers_db_operations::{self, WORKERS};
use super::DbError;
use crate::models::{Task, TaskStatus, TaskWithOwner};

pub const TASKS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("tasks");

pub fn insert_task(db: &Database, task: &Task) -> Result<(), DbError> {
    let task_json = serde_json::to_string(task)?;
    let task_id_bytes = task.id.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut tasks_table = write_txn.open_table(TASKS)?;
        tasks_table.insert(&task_id_bytes, task_json.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_task(db: &Database, id: &Uuid) -> Result<Option<Task>, DbError> {
    let task_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let tasks_table = read_txn.open_table(TASKS)?;

    let result = match tasks_table.get(&task_id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn list_tasks_with_owners(db: &Database) -> Result<Vec<TaskWithOwner>, DbError> {
    let read_txn = db.begin_read()?;
    let tasks_table = read_txn.open_table(TASKS)?;
    let workers_table = read_txn.open_table(WORKERS)?;

    let tasks = tasks_table
        .iter()?
        .filter_map(|res| res.ok())
        .filter_map(|(_, task_json)| serde_json::from_str::<Task>(task_json.value()).ok())
        .map(|task| {
            let worker =
                workers_db_operations::identity_from_table(&workers_table, &task.worker_id);
            TaskWithOwner { task, worker }
        })
        .collect();
    Ok(tasks)
}

/// Overwrites the status field. Any status may follow any other; there is no
/// transition graph.
pub fn update_task_status(
    db: &Database,
    id: &Uuid,
    status: TaskStatus,
) -> Result<Task, DbError> {
    let task_id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut tasks_table = write_txn.open_table(TASKS)?;

        let mut task: Task = {
            let guard = tasks_table
                .get(&task_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Task {} not found", id)))?;
            serde_json::from_str(guard.value())?
        };

        task.status = status;
        let task_json = serde_json::to_string(&task)?;
        tasks_table.insert(&task_id_bytes, task_json.as_str())?;
        task
    };
    write_txn.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::setup::db_setup;

    fn open_store(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("documents.db")).unwrap();
        db_setup::setup_documents_db(&db).unwrap();
        db
    }

    fn sample_task(worker_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            worker_id,
            title: "Survey drainage".to_string(),
            description: "Walk the northern stretch".to_string(),
            department: "Public Works".to_string(),
            dependencies: vec!["road closure permit".to_string()],
            status: TaskStatus::InProgress,
            due_date: now,
            created_datetime: now,
        }
    }

    #[test]
    fn status_overwrite_is_unconditional() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let task = sample_task(Uuid::new_v4());
        insert_task(&db, &task).unwrap();

        // Completed -> Planning is allowed; there is no transition graph.
        update_task_status(&db, &task.id, TaskStatus::Completed).unwrap();
        let updated = update_task_status(&db, &task.id, TaskStatus::Planning).unwrap();
        assert_eq!(updated.status, TaskStatus::Planning);

        let fetched = read_task(&db, &task.id).unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Planning);
    }

    #[test]
    fn status_update_on_missing_task_is_not_found() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let result = update_task_status(&db, &Uuid::new_v4(), TaskStatus::Delayed);
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn dependencies_survive_as_free_text() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let task = sample_task(Uuid::new_v4());
        insert_task(&db, &task).unwrap();

        let fetched = read_task(&db, &task.id).unwrap().unwrap();
        assert_eq!(fetched.dependencies, vec!["road closure permit".to_string()]);
    }
}
