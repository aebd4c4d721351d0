use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::DbError;
use crate::models::{Post, Reply};

pub const POSTS: TableDefinition<&[u8; 16], &str> = TableDefinition::new("posts");
/// Newest-first listing index: (negated creation timestamp, post id).
pub const POST_CHRONOLOGICAL_INDEX: TableDefinition<(i64, &[u8; 16]), ()> =
    TableDefinition::new("post_chronological_index");

pub fn insert_post(db: &Database, post: &Post) -> Result<(), DbError> {
    let post_json = serde_json::to_string(post)?;
    let post_id_bytes = post.id.into_bytes();
    let timestamp = -post.created_at.timestamp();

    let write_txn = db.begin_write()?;
    {
        let mut posts_table = write_txn.open_table(POSTS)?;
        let mut chrono_index = write_txn.open_table(POST_CHRONOLOGICAL_INDEX)?;

        posts_table.insert(&post_id_bytes, post_json.as_str())?;
        chrono_index.insert((timestamp, &post_id_bytes), ())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn read_post(db: &Database, id: &Uuid) -> Result<Option<Post>, DbError> {
    let post_id_bytes = id.into_bytes();

    let read_txn = db.begin_read()?;
    let posts_table = read_txn.open_table(POSTS)?;

    let result = match posts_table.get(&post_id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn list_posts_newest_first(db: &Database) -> Result<Vec<Post>, DbError> {
    let read_txn = db.begin_read()?;
    let chrono_index = read_txn.open_table(POST_CHRONOLOGICAL_INDEX)?;
    let posts_table = read_txn.open_table(POSTS)?;

    let posts = chrono_index
        .iter()?
        .filter_map(|item_result| {
            item_result.ok().and_then(|(key, _value)| {
                let post_id_bytes = key.value().1;
                posts_table
                    .get(post_id_bytes)
                    .ok()
                    .flatten()
                    .and_then(|post_json| serde_json::from_str(post_json.value()).ok())
            })
        })
        .collect();
    Ok(posts)
}

pub fn append_reply(db: &Database, post_id: &Uuid, reply: Reply) -> Result<Post, DbError> {
    let post_id_bytes = post_id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut posts_table = write_txn.open_table(POSTS)?;

        let mut post: Post = {
            let guard = posts_table
                .get(&post_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Post {} not found", post_id)))?;
            serde_json::from_str(guard.value())?
        };

        post.replies.push(reply);
        let post_json = serde_json::to_string(&post)?;
        posts_table.insert(&post_id_bytes, post_json.as_str())?;
        post
    };
    write_txn.commit()?;
    Ok(updated)
}

/// Removes the reply with the given id. A reply id that matches nothing is a
/// silent no-op; only a missing post is an error.
pub fn remove_reply(db: &Database, post_id: &Uuid, reply_id: &Uuid) -> Result<Post, DbError> {
    let post_id_bytes = post_id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut posts_table = write_txn.open_table(POSTS)?;

        let mut post: Post = {
            let guard = posts_table
                .get(&post_id_bytes)?
                .ok_or_else(|| DbError::NotFound(format!("Post {} not found", post_id)))?;
            serde_json::from_str(guard.value())?
        };

        post.replies.retain(|reply| reply.id != *reply_id);
        let post_json = serde_json::to_string(&post)?;
        posts_table.insert(&post_id_bytes, post_json.as_str())?;
        post
    };
    write_txn.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use crate::models::AccessLevel;
    use crate::setup::db_setup;

    fn open_store(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("documents.db")).unwrap();
        db_setup::setup_documents_db(&db).unwrap();
        db
    }

    fn sample_post(title: &str) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Asha Rao".to_string(),
            department: "Public Works".to_string(),
            content: "Weekly sync notes".to_string(),
            access_level: AccessLevel::InterDepartment,
            replies: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn sample_reply(name: &str) -> Reply {
        Reply {
            id: Uuid::new_v4(),
            worker_id: None,
            worker_name: name.to_string(),
            content: "Noted".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn listings_are_newest_first() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let mut older = sample_post("Older");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = sample_post("Newer");

        insert_post(&db, &older).unwrap();
        insert_post(&db, &newer).unwrap();

        let listed = list_posts_newest_first(&db).unwrap();
        assert_eq!(listed[0].title, "Newer");
        assert_eq!(listed[1].title, "Older");
    }

    #[test]
    fn replies_append_with_generated_ids() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let post = sample_post("Sync");
        insert_post(&db, &post).unwrap();

        append_reply(&db, &post.id, sample_reply("Ravi")).unwrap();
        let updated = append_reply(&db, &post.id, sample_reply("Mina")).unwrap();

        assert_eq!(updated.replies.len(), 2);
        assert_ne!(updated.replies[0].id, updated.replies[1].id);
        assert_eq!(updated.replies[1].worker_name, "Mina");

        let fetched = read_post(&db, &post.id).unwrap().unwrap();
        assert_eq!(fetched.replies.len(), 2);
    }

    #[test]
    fn reply_to_missing_post_is_not_found() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let result = append_reply(&db, &Uuid::new_v4(), sample_reply("Ravi"));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn removing_a_missing_reply_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let post = sample_post("Sync");
        insert_post(&db, &post).unwrap();
        append_reply(&db, &post.id, sample_reply("Ravi")).unwrap();

        let updated = remove_reply(&db, &post.id, &Uuid::new_v4()).unwrap();
        assert_eq!(updated.replies.len(), 1);
    }

    #[test]
    fn removing_an_existing_reply_deletes_only_that_reply() {
        let dir = TempDir::new().unwrap();
        let db = open_store(&dir);

        let post = sample_post("Sync");
        insert_post(&db, &post).unwrap();
        let with_first = append_reply(&db, &post.id, sample_reply("Ravi")).unwrap();
        append_reply(&db, &post.id, sample_reply("Mina")).unwrap();

        let target = with_first.replies[0].id;
        let updated = remove_reply(&db, &post.id, &target).unwrap();
        assert_eq!(updated.replies.len(), 1);
        assert_eq!(updated.replies[0].worker_name, "Mina");
    }
}
