use crate::config::Config;
use crate::helper::{form_helpers, media_helpers};
use crate::middleware::AuthenticatedWorker;
use crate::models::db_operations::{projects_db_operations, DbError};
use crate::models::{Budget, ContactPerson, Milestone, Project, ProjectStatus};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use redb::Database;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectRequest {
    project_code: Option<String>,
    title: Option<String>,
    objective: Option<String>,
    description: Option<String>,
    scope_of_work: Option<String>,
    #[serde(default, deserialize_with = "form_helpers::deserialize_string_list")]
    technologies_used: Vec<String>,
    #[serde(default, deserialize_with = "form_helpers::deserialize_string_list")]
    departments: Vec<String>,
    lead_department: Option<String>,
    status: Option<ProjectStatus>,
    location: Option<String>,
    start_date: Option<String>,
    deadline: Option<String>,
    milestones: Option<Vec<Milestone>>,
    budget: Option<Budget>,
    challenges: Option<String>,
    impact: Option<String>,
    contact_person: Option<ContactPerson>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/add/projects", web::post().to(create_project))
        .route("/show/projects", web::get().to(list_projects))
        .route("/show/projects/{id}", web::get().to(get_project))
        .route("/api/projects/{id}/media", web::post().to(upload_project_media));
}

fn required_field<'a>(value: &'a Option<String>) -> Option<&'a str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

async fn create_project(
    auth_worker: AuthenticatedWorker,
    db: web::Data<Database>,
    payload: web::Json<CreateProjectRequest>,
) -> impl Responder {
    let body = payload.into_inner();

    let title = match required_field(&body.title) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Project name is required." })),
    };
    let description = match required_field(&body.description) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Project description is required." })),
    };
    let location = match required_field(&body.location) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Project location is required." })),
    };
    let budget = match body.budget {
        Some(budget) => budget,
        None => return HttpResponse::BadRequest().json(json!({ "message": "Project budget is required." })),
    };
    let lead_department = match required_field(&body.lead_department) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Lead department is required." })),
    };
    if body.departments.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "At least one department is required." }));
    }

    let start_date = match body.start_date.as_deref().and_then(form_helpers::parse_date) {
        Some(date) => date,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "message": "Invalid start date format. Please provide a valid date."
            }))
        }
    };
    let deadline = match body.deadline.as_deref().and_then(form_helpers::parse_date) {
        Some(date) => date,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "message": "Invalid deadline format. Please provide a valid date."
            }))
        }
    };

    // Codes like "TRF-001" may come from the client; otherwise one is generated.
    let project_code = body
        .project_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_project_code);

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        project_code,
        worker_id: auth_worker.worker_id,
        title,
        objective: body.objective,
        description,
        scope_of_work: body.scope_of_work,
        technologies_used: body.technologies_used,
        departments: body.departments,
        lead_department,
        status: body.status.unwrap_or_default(),
        location,
        start_date,
        deadline,
        milestones: body.milestones.unwrap_or_default(),
        progress_percentage: 0,
        last_updated: now,
        budget,
        challenges: body.challenges,
        impact: body.impact,
        contact_person: body.contact_person,
        media: Vec::new(),
        public_feedback: Vec::new(),
        created_datetime: now,
    };

    match projects_db_operations::insert_project(&db, &project) {
        Ok(()) => HttpResponse::Created().json(json!({
            "message": "Project created successfully",
            "project": project
        })),
        Err(DbError::Duplicate(msg)) => {
            HttpResponse::BadRequest().json(json!({ "message": msg }))
        }
        Err(e) => {
            log::error!("Failed to create project: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error creating project" }))
        }
    }
}

fn generate_project_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("PRJ-{}", id[..8].to_uppercase())
}

async fn list_projects(db: web::Data<Database>) -> impl Responder {
    match projects_db_operations::list_projects_with_owners(&db) {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => {
            log::error!("Failed to list projects: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving projects" }))
        }
    }
}

async fn get_project(db: web::Data<Database>, path: web::Path<Uuid>) -> impl Responder {
    let project_id = path.into_inner();
    match projects_db_operations::read_project_with_owner(&db, &project_id) {
        Ok(Some(project)) => HttpResponse::Ok().json(project),
        Ok(None) => HttpResponse::NotFound().json(json!({ "message": "Project not found" })),
        Err(e) => {
            log::error!("Failed to fetch project {}: {}", project_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving project" }))
        }
    }
}

async fn upload_project_media(
    _auth_worker: AuthenticatedWorker,
    db: web::Data<Database>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> impl Responder {
    let project_id = path.into_inner();
    let uploads_dir = PathBuf::from(&config.uploads_path);

    let (_fields, saved_files) =
        match media_helpers::collect_multipart(&uploads_dir, payload, "media", 5).await {
            Ok(parts) => parts,
            Err(e) => return HttpResponse::BadRequest().json(json!({ "message": e.to_string() })),
        };

    if saved_files.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "No media files were uploaded." }));
    }

    let media_paths: Vec<String> = saved_files
        .iter()
        .map(|file| file.url_path.clone())
        .collect();

    match projects_db_operations::append_project_media(&db, &project_id, &media_paths) {
        Ok(_) => HttpResponse::Ok().json(json!({
            "message": "Media uploaded successfully",
            "media": media_paths
        })),
        Err(DbError::NotFound(_)) => {
            // The files are already on disk; remove them rather than orphan them.
            media_helpers::remove_saved_files(&saved_files);
            HttpResponse::NotFound().json(json!({ "message": "Project not found" }))
        }
        Err(e) => {
            log::error!("Error uploading media for project {}: {}", project_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error uploading media" }))
        }
    }
}
