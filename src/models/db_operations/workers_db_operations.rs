use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::DbError;
use crate::models::{Worker, WorkerIdentity};

pub const WORKERS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("workers");

pub fn insert_worker(db: &Database, worker: &Worker) -> Result<(), DbError> {
    let worker_json = serde_json::to_string(worker)?;
    let worker_id_bytes = worker.id.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut workers_table = write_txn.open_table(WORKERS)?;
        workers_table.insert(&worker_id_bytes, worker_json.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_worker(db: &Database, id: &Uuid) -> Result<Option<Worker>, DbError> {
    let worker_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let workers_table = read_txn.open_table(WORKERS)?;

    let result = match workers_table.get(&worker_id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn list_workers(db: &Database) -> Result<Vec<Worker>, DbError> {
    let read_txn = db.begin_read()?;
    let workers_table = read_txn.open_table(WORKERS)?;

    let workers = workers_table
        .iter()?
        .filter_map(|res| res.ok())
        .filter_map(|(_, worker_json)| serde_json::from_str(worker_json.value()).ok())
        .collect();
    Ok(workers)
}

/// Resolves a worker reference into the name/email projection attached to
/// listings. Missing workers resolve to `None` rather than failing the list.
pub(super) fn identity_from_table<T>(table: &T, worker_id: &Uuid) -> Option<WorkerIdentity>
where
    T: ReadableTable<&'static [u8; 16], &'static str>,
{
    let worker_id_bytes = worker_id.into_bytes();
    let guard = table.get(&worker_id_bytes).ok().flatten()?;
    let worker: Worker = serde_json::from_str(guard.value()).ok()?;
    Some(WorkerIdentity {
        id: worker.id,
        name: worker.name,
        email: worker.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("documents.db")).unwrap();
        db_setup::setup_documents_db(&db).unwrap();
        db
    }

    #[test]
    fn insert_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let worker = Worker {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@city.gov".to_string(),
            department: "Public Works".to_string(),
        };
        insert_worker(&db, &worker).unwrap();

        let fetched = read_worker(&db, &worker.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Asha Rao");
        assert_eq!(fetched.email, "asha@city.gov");
    }

    #[test]
    fn unknown_worker_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        assert!(read_worker(&db, &Uuid::new_v4()).unwrap().is_none());
    }
}
