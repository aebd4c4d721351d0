use crate::helper::form_helpers;
use crate::middleware::AuthenticatedWorker;
use crate::models::db_operations::{tasks_db_operations, DbError};
use crate::models::{Task, TaskStatus};
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use redb::Database;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    department: Option<String>,
    #[serde(default, deserialize_with = "form_helpers::deserialize_string_list")]
    dependencies: Vec<String>,
    status: Option<TaskStatus>,
    due_date: Option<String>,
}

#[derive(Deserialize)]
struct TaskStatusUpdate {
    status: TaskStatus,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/add/tasks", web::post().to(create_task))
        .route("/show/tasks", web::get().to(list_tasks))
        .route("/update/task/{id}", web::put().to(update_task_status));
}

fn required_field<'a>(value: &'a Option<String>) -> Option<&'a str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

async fn create_task(
    auth_worker: AuthenticatedWorker,
    db: web::Data<Database>,
    payload: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let body = payload.into_inner();

    let title = match required_field(&body.title) {
        Some(value) => value.to_string(),
        None => return HttpResponse::BadRequest().json(json!({ "message": "Task title is required." })),
    };
    let description = match required_field(&body.description) {
        Some(value) => value.to_string(),
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Task description is required." }))
        }
    };
    let department = match required_field(&body.department) {
        Some(value) => value.to_string(),
        None => {
            return HttpResponse::BadRequest().json(json!({ "message": "Department is required." }))
        }
    };
    let due_date = match body.due_date.as_deref().and_then(form_helpers::parse_date) {
        Some(date) => date,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "message": "Invalid due date format. Please provide a valid date."
            }))
        }
    };

    let task = Task {
        id: Uuid::new_v4(),
        worker_id: auth_worker.worker_id,
        title,
        description,
        department,
        dependencies: body.dependencies,
        status: body.status.unwrap_or(TaskStatus::InProgress),
        due_date,
        created_datetime: Utc::now(),
    };

    match tasks_db_operations::insert_task(&db, &task) {
        Ok(()) => HttpResponse::Created().json(json!({
            "message": "Task created successfully",
            "task": task
        })),
        Err(e) => {
            log::error!("Failed to create task: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error creating task" }))
        }
    }
}

async fn list_tasks(db: web::Data<Database>) -> impl Responder {
    match tasks_db_operations::list_tasks_with_owners(&db) {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => {
            log::error!("Failed to list tasks: {}", e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error retrieving tasks" }))
        }
    }
}

async fn update_task_status(
    _auth_worker: AuthenticatedWorker,
    db: web::Data<Database>,
    path: web::Path<Uuid>,
    payload: web::Json<TaskStatusUpdate>,
) -> impl Responder {
    let task_id = path.into_inner();

    match tasks_db_operations::update_task_status(&db, &task_id, payload.status) {
        Ok(task) => HttpResponse::Ok().json(json!({
            "message": "Task status updated successfully",
            "task": task
        })),
        Err(DbError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Task not found." }))
        }
        Err(e) => {
            log::error!("Failed to update task {}: {}", task_id, e);
            HttpResponse::InternalServerError().json(json!({ "message": "Error updating task" }))
        }
    }
}
