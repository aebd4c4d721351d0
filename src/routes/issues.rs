use crate::config::Config;
use crate::helper::media_helpers;
use crate::models::db_operations::{issues_db_operations, projects_db_operations, DbError};
use crate::models::{Issue, IssueStatus};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use redb::Database;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Deserialize)]
struct IssueStatusUpdate {
    status: IssueStatus,
}

#[derive(Deserialize)]
struct IssueComment {
    user: String,
    comment: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/projects/list", web::get().to(list_project_options))
        .route("/report/issues", web::post().to(report_issue))
        .route("/citizen/issues", web::get().to(list_issues))
        .route(
            "/citizen/issues/by-project/{projectId}",
            web::get().to(list_issues_by_project),
        )
        .route("/issues/{issueId}/status", web::put().to(update_issue_status))
        .route("/issues/{issueId}/comments", web::post().to(add_issue_comment));
}

async fn list_project_options(db: web::Data<Database>) -> impl Responder {
    match projects_db_operations::list_project_options(&db) {
        Ok(options) => HttpResponse::Ok().json(options),
        Err(e) => {
            log::error!("Failed to list project options: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving projects" }))
        }
    }
}

fn required_text<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
}

async fn report_issue(
    db: web::Data<Database>,
    config: web::Data<Config>,
    payload: Multipart,
) -> impl Responder {
    let uploads_dir = PathBuf::from(&config.uploads_path);

    let (fields, saved_files) =
        match media_helpers::collect_multipart(&uploads_dir, payload, "attachment", 1).await {
            Ok(parts) => parts,
            Err(e) => return HttpResponse::BadRequest().json(json!({ "message": e.to_string() })),
        };

    let reject = |message: &str, files: &[media_helpers::SavedFile]| {
        media_helpers::remove_saved_files(files);
        HttpResponse::BadRequest().json(json!({ "message": message }))
    };

    let title = match required_text(&fields, "title") {
        Some(value) => value.to_string(),
        None => return reject("Issue title is required.", &saved_files),
    };
    let description = match required_text(&fields, "description") {
        Some(value) => value.to_string(),
        None => return reject("Issue description is required.", &saved_files),
    };
    let department = match required_text(&fields, "department") {
        Some(value) => value.to_string(),
        None => return reject("Department is required.", &saved_files),
    };
    let location = match required_text(&fields, "location") {
        Some(value) => value.to_string(),
        None => return reject("Location is required.", &saved_files),
    };

    let status = match required_text(&fields, "status") {
        Some(raw) => match serde_json::from_value::<IssueStatus>(json!(raw)) {
            Ok(status) => status,
            Err(_) => return reject("Invalid issue status.", &saved_files),
        },
        None => IssueStatus::default(),
    };

    // The dropdown sends "none" when no project is selected. A linked project
    // id is stored even if it no longer resolves; the name is only
    // denormalized when it does.
    let mut project = None;
    let mut project_name = None;
    if let Some(raw_id) = required_text(&fields, "projectId").filter(|v| *v != "none") {
        let project_id = match Uuid::parse_str(raw_id) {
            Ok(id) => id,
            Err(_) => return reject("Invalid project id.", &saved_files),
        };
        project = Some(project_id);
        match projects_db_operations::read_project(&db, &project_id) {
            Ok(Some(linked)) => project_name = Some(linked.title),
            Ok(None) => {}
            Err(e) => {
                log::error!("Failed to resolve project {}: {}", project_id, e);
                media_helpers::remove_saved_files(&saved_files);
                return HttpResponse::InternalServerError()
                    .json(json!({ "message": "Error reporting issue" }));
            }
        }
    }

    let issue = Issue {
        id: Uuid::new_v4(),
        title,
        description,
        department,
        location,
        status,
        attachment: saved_files.first().map(|file| file.url_path.clone()),
        project,
        project_name,
        public_feedback: Vec::new(),
        created_at: Utc::now(),
    };

    match issues_db_operations::insert_issue(&db, &issue) {
        Ok(()) => HttpResponse::Created().json(json!({
            "message": "Issue reported successfully!",
            "issue": issue
        })),
        Err(e) => {
            log::error!("Failed to report issue: {}", e);
            media_helpers::remove_saved_files(&saved_files);
            HttpResponse::InternalServerError().json(json!({ "message": "Error reporting issue" }))
        }
    }
}

async fn list_issues(db: web::Data<Database>) -> impl Responder {
    match issues_db_operations::list_issues_newest_first(&db) {
        Ok(issues) => HttpResponse::Ok().json(issues),
        Err(e) => {
            log::error!("Failed to list issues: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving issues" }))
        }
    }
}

async fn list_issues_by_project(db: web::Data<Database>, path: web::Path<Uuid>) -> impl Responder {
    let project_id = path.into_inner();
    match issues_db_operations::list_issues_by_project(&db, &project_id) {
        Ok(issues) => HttpResponse::Ok().json(issues),
        Err(e) => {
            log::error!("Failed to list issues for project {}: {}", project_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving issues" }))
        }
    }
}

async fn update_issue_status(
    db: web::Data<Database>,
    path: web::Path<Uuid>,
    payload: web::Json<IssueStatusUpdate>,
) -> impl Responder {
    let issue_id = path.into_inner();

    match issues_db_operations::update_issue_status(&db, &issue_id, payload.status) {
        Ok(issue) => HttpResponse::Ok().json(json!({
            "message": "Issue status updated successfully",
            "issue": issue
        })),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Issue not found." }))
        }
        Err(e) => {
            log::error!("Failed to update issue {}: {}", issue_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error updating issue" }))
        }
    }
}

async fn add_issue_comment(
    db: web::Data<Database>,
    path: web::Path<Uuid>,
    payload: web::Json<IssueComment>,
) -> impl Responder {
    let issue_id = path.into_inner();
    let user = payload.user.trim();
    let comment = payload.comment.trim();

    if user.is_empty() || comment.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "User and comment are required." }));
    }

    match issues_db_operations::append_issue_feedback(&db, &issue_id, user, comment) {
        Ok(issue) => HttpResponse::Ok().json(json!({
            "message": "Comment added successfully",
            "issue": issue
        })),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Issue not found." }))
        }
        Err(e) => {
            log::error!("Failed to comment on issue {}: {}", issue_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error adding comment" }))
        }
    }
}
