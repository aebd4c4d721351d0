use crate::models::db_operations::{posts_db_operations, DbError};
use crate::models::{AccessLevel, Post, Reply};
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use redb::Database;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    title: Option<String>,
    author: Option<String>,
    department: Option<String>,
    content: Option<String>,
    access_level: Option<AccessLevel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReplyRequest {
    worker_id: Option<Uuid>,
    worker_name: Option<String>,
    content: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/create", web::post().to(create_post))
        .route("/get/post", web::get().to(list_posts))
        .route("/{postId}/reply", web::post().to(add_reply))
        .route("/{postId}/reply/{replyId}", web::delete().to(delete_reply));
}

async fn create_post(
    db: web::Data<Database>,
    payload: web::Json<CreatePostRequest>,
) -> impl Responder {
    let body = payload.into_inner();

    let author = match body.author.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Author is required" })),
    };

    let post = Post {
        id: Uuid::new_v4(),
        title: body.title.unwrap_or_default(),
        author,
        department: body.department.unwrap_or_default(),
        content: body.content.unwrap_or_default(),
        access_level: body.access_level.unwrap_or_default(),
        replies: Vec::new(),
        created_at: Utc::now(),
    };

    match posts_db_operations::insert_post(&db, &post) {
        Ok(()) => HttpResponse::Created().json(post),
        Err(e) => {
            log::error!("Failed to create post: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error creating post" }))
        }
    }
}

async fn list_posts(db: web::Data<Database>) -> impl Responder {
    match posts_db_operations::list_posts_newest_first(&db) {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => {
            log::error!("Failed to list posts: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving posts" }))
        }
    }
}

async fn add_reply(
    db: web::Data<Database>,
    path: web::Path<Uuid>,
    payload: web::Json<CreateReplyRequest>,
) -> impl Responder {
    let post_id = path.into_inner();
    let body = payload.into_inner();

    let worker_name = match body
        .worker_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(value) => value.to_string(),
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Worker name and content are required" }))
        }
    };
    let content = match body.content.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.to_string(),
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Worker name and content are required" }))
        }
    };

    let reply = Reply {
        id: Uuid::new_v4(),
        worker_id: body.worker_id,
        worker_name,
        content,
        created_at: Utc::now(),
    };

    match posts_db_operations::append_reply(&db, &post_id, reply) {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Post not found" }))
        }
        Err(e) => {
            log::error!("Failed to add reply to post {}: {}", post_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error adding reply" }))
        }
    }
}

async fn delete_reply(db: web::Data<Database>, path: web::Path<(Uuid, Uuid)>) -> impl Responder {
    let (post_id, reply_id) = path.into_inner();

    // Removing a reply id that is not on the post still returns the post;
    // only a missing post is an error.
    match posts_db_operations::remove_reply(&db, &post_id, &reply_id) {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Post not found" }))
        }
        Err(e) => {
            log::error!(
                "Failed to delete reply {} from post {}: {}",
                reply_id,
                post_id,
                e
            );
            HttpResponse::InternalServerError().json(json!({ "message": "Error deleting reply" }))
        }
    }
}
