use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::workers_db_operations::{self, WORKERS};
use super::DbError;
use crate::models::{Project, ProjectOption, ProjectWithOwner};

pub const PROJECTS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("projects");
/// Unique-code index: project code -> project id.
pub const PROJECT_CODES: TableDefinition<&str, &[u8; 16]> = TableDefinition::new("project_codes");

pub fn insert_project(db: &Database, project: &Project) -> Result<(), DbError> {
    let project_json = serde_json::to_string(project)?;
    let project_id_bytes = project.id.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut projects_table = write_txn.open_table(PROJECTS)?;
        let mut codes_table = write_txn.open_table(PROJECT_CODES)?;

        if codes_table.get(project.project_code.as_str())?.is_some() {
            return Err(DbError::Duplicate(format!(
                "Project code '{}' is already in use",
                project.project_code
            )));
        }

        projects_table.insert(&project_id_bytes, project_json.as_str())?;
        codes_table.insert(project.project_code.as_str(), &project_id_bytes)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_project(db: &Database, id: &Uuid) -> Result<Option<Project>, DbError> {
    let project_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let projects_table = read_txn.open_table(PROJECTS)?;

    let result = match projects_table.get(&project_id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn read_project_with_owner(
    db: &Database,
    id: &Uuid,
) -> Result<Option<ProjectWithOwner>, DbError> {
    let project_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let projects_table = read_txn.open_table(PROJECTS)?;
    let workers_table = read_txn.open_table(WORKERS)?;

    let result = match projects_table.get(&project_id_bytes)? {
        Some(guard) => {
            let project: Project = serde_json::from_str(guard.value())?;
            let worker = workers_db_operations::identity_from_table(&workers_table, &project.worker_id);
            Ok(Some(ProjectWithOwner { project, worker }))
        }
        None => Ok(None),
    };
    result
}

pub fn list_projects_with_owners(db: &Database) -> Result<Vec<ProjectWithOwner>, DbError> {
    let read_txn = db.begin_read()?;
    let projects_table = read_txn.open_table(PROJECTS)?;
    let workers_table = read_txn.open_table(WORKERS)?;

    let projects = projects_table
        .iter()?
        .filter_map(|res| res.ok())
        .filter_map(|(_, project_json)| {
            serde_json::from_str::<Project>(project_json.value()).ok()
        })
        .map(|project| {
            let worker =
                workers_db_operations::identity_from_table(&workers_table, &project.worker_id);
            ProjectWithOwner { project, worker }
        })
        .collect();
    Ok(projects)
}

/// Id + title projection for the issue-report dropdown.
pub fn list_project_options(db: &Database) -> Result<Vec<ProjectOption>, DbError> {
    let read_txn = db.begin_read()?;
    let projects_table = read_txn.open_table(PROJECTS)?;

    let options = projects_table
        .iter()?
        .filter_map(|res| res.ok())
        .filter_map(|(_, project_json)| {
            serde_json::from_str::<Project>(project_json.value()).ok()
        })
        .map(|project| ProjectOption {
            id: project.id,
            title: project.title,
        })
        .collect();
    Ok(options)
}

/// Appends uploaded media paths to a project's media list and bumps its
/// `lastUpdated` stamp. Returns the updated document.
pub fn append_project_media(
    db: &Database,
    id: &Uuid,
    media_paths: &[String],
) -> Result<Project, DbError> {
    let project_id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut projects_table = write_txn.open_table(PROJECTS)?;

        let mut project: Project = {
            let guard = projects_table
                .get(&project_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Project {} not found", id)))?;
            serde_json::from_str(guard.value())?
        };

        project.media.extend(media_paths.iter().cloned());
        project.last_updated = Utc::now();

        let project_json = serde_json::to_string(&project)?;
        projects_table.insert(&project_id_bytes, project_json.as_str())?;
        project
    };
    write_txn.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, ProjectStatus, Worker};
    use crate::setup::db_setup;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("documents.db")).unwrap();
        db_setup::setup_documents_db(&db).unwrap();
        db
    }

    fn sample_project(code: &str, worker_id: Uuid) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            project_code: code.to_string(),
            worker_id,
            title: "Road Repair".to_string(),
            objective: None,
            description: "Fix road".to_string(),
            scope_of_work: None,
            technologies_used: Vec::new(),
            departments: vec!["Public Works".to_string()],
            lead_department: "Public Works".to_string(),
            status: ProjectStatus::default(),
            location: "Main St".to_string(),
            start_date: now,
            deadline: now,
            milestones: Vec::new(),
            progress_percentage: 0,
            last_updated: now,
            budget: Budget {
                total: 1000.0,
                utilized: 0.0,
            },
            challenges: None,
            impact: None,
            contact_person: None,
            media: Vec::new(),
            public_feedback: Vec::new(),
            created_datetime: now,
        }
    }

    #[test]
    fn new_projects_default_to_planned_with_zero_progress() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let project = sample_project("PRJ-0001", Uuid::new_v4());
        insert_project(&db, &project).unwrap();

        let fetched = read_project(&db, &project.id).unwrap().unwrap();
        assert_eq!(fetched.status, ProjectStatus::Planned);
        assert_eq!(fetched.progress_percentage, 0);
        assert_eq!(fetched.budget.utilized, 0.0);
    }

    #[test]
    fn duplicate_project_codes_are_rejected() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        insert_project(&db, &sample_project("PRJ-0001", Uuid::new_v4())).unwrap();
        let second = sample_project("PRJ-0001", Uuid::new_v4());
        assert!(matches!(
            insert_project(&db, &second),
            Err(DbError::Duplicate(_))
        ));
        // The rejected document must not have been stored.
        assert!(read_project(&db, &second.id).unwrap().is_none());
    }

    #[test]
    fn listing_resolves_owner_identity() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let worker = Worker {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@city.gov".to_string(),
            department: "Public Works".to_string(),
        };
        workers_db_operations::insert_worker(&db, &worker).unwrap();
        insert_project(&db, &sample_project("PRJ-0002", worker.id)).unwrap();

        let listed = list_projects_with_owners(&db).unwrap();
        assert_eq!(listed.len(), 1);
        let owner = listed[0].worker.as_ref().unwrap();
        assert_eq!(owner.name, "Asha Rao");
        assert_eq!(owner.email, "asha@city.gov");
    }

    #[test]
    fn missing_owner_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        insert_project(&db, &sample_project("PRJ-0003", Uuid::new_v4())).unwrap();
        let listed = list_projects_with_owners(&db).unwrap();
        assert!(listed[0].worker.is_none());
    }

    #[test]
    fn media_append_updates_document() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let project = sample_project("PRJ-0004", Uuid::new_v4());
        insert_project(&db, &project).unwrap();

        let paths = vec!["/uploads/a.jpg".to_string(), "/uploads/b.pdf".to_string()];
        let updated = append_project_media(&db, &project.id, &paths).unwrap();
        assert_eq!(updated.media, paths);

        let fetched = read_project(&db, &project.id).unwrap().unwrap();
        assert_eq!(fetched.media, paths);
    }

    #[test]
    fn media_append_on_missing_project_is_not_found() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let result = append_project_media(&db, &Uuid::new_v4(), &["/uploads/x.png".to_string()]);
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }
}
