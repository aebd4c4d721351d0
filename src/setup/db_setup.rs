use redb::Database;

use crate::models::db_operations::issues_db_operations::{
    ISSUES, ISSUE_CHRONOLOGICAL_INDEX, ISSUE_PROJECT_INDEX,
};
use crate::models::db_operations::posts_db_operations::{POSTS, POST_CHRONOLOGICAL_INDEX};
use crate::models::db_operations::projects_db_operations::{PROJECTS, PROJECT_CODES};
use crate::models::db_operations::tasks_db_operations::TASKS;
use crate::models::db_operations::workers_db_operations::WORKERS;
use crate::models::db_operations::DbError;

/// Opens every table once so the document store is fully initialized before
/// the server first touches it.
pub fn setup_documents_db(db: &Database) -> Result<(), DbError> {
    let write_txn = db.begin_write()?;
    {
        println!("- Creating 'workers' table...");
        write_txn.open_table(WORKERS)?;

        println!("- Creating 'projects' table...");
        write_txn.open_table(PROJECTS)?;

        println!("- Creating 'project_codes' table...");
        write_txn.open_table(PROJECT_CODES)?;

        println!("- Creating 'tasks' table...");
        write_txn.open_table(TASKS)?;

        println!("- Creating 'issues' table...");
        write_txn.open_table(ISSUES)?;

        println!("- Creating 'issue_chronological_index' table...");
        write_txn.open_table(ISSUE_CHRONOLOGICAL_INDEX)?;

        println!("- Creating 'issue_project_index' table...");
        write_txn.open_table(ISSUE_PROJECT_INDEX)?;

        println!("- Creating 'posts' table...");
        write_txn.open_table(POSTS)?;

        println!("- Creating 'post_chronological_index' table...");
        write_txn.open_table(POST_CHRONOLOGICAL_INDEX)?;
    }
    write_txn.commit()?;
    Ok(())
}
