use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff account referenced by projects and tasks. Registration happens
/// through the setup CLI; the web tier only ever reads these.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
}

/// The owner projection attached to project/task listings (name and email
/// only, never the full worker record).
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkerIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Delayed,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planned
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Planning,
    Delayed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Rejected,
}

impl Default for IssueStatus {
    fn default() -> Self {
        IssueStatus::Pending
    }
}

/// Display-only access marker on forum posts. Nothing enforces it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Public,
    #[serde(rename = "Inter Department")]
    InterDepartment,
    #[serde(rename = "Intra Department")]
    IntraDepartment,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Public
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub total: f64,
    #[serde(default)]
    pub utilized: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    pub name: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A citizen comment left on a project or an issue.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub user: String,
    pub comment: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub project_code: String,
    pub worker_id: Uuid,
    pub title: String,
    pub objective: Option<String>,
    pub description: String,
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub technologies_used: Vec<String>,
    pub departments: Vec<String>,
    pub lead_department: String,
    #[serde(default)]
    pub status: ProjectStatus,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub progress_percentage: u8,
    pub last_updated: DateTime<Utc>,
    pub budget: Budget,
    pub challenges: Option<String>,
    pub impact: Option<String>,
    pub contact_person: Option<ContactPerson>,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub public_feedback: Vec<FeedbackEntry>,
    pub created_datetime: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub title: String,
    pub description: String,
    pub department: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_datetime: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub department: String,
    pub location: String,
    #[serde(default)]
    pub status: IssueStatus,
    pub attachment: Option<String>,
    /// Optional link to a project. The title is denormalized at creation
    /// time and is not resynced if the project is later renamed.
    pub project: Option<Uuid>,
    pub project_name: Option<String>,
    #[serde(default)]
    pub public_feedback: Vec<FeedbackEntry>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub worker_id: Option<Uuid>,
    pub worker_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

/// A project with its owner identity resolved, as returned by the listing
/// endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub worker: Option<WorkerIdentity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,
    pub worker: Option<WorkerIdentity>,
}

/// Minimal id + title projection backing the issue-report dropdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOption {
    pub id: Uuid,
    pub title: String,
}

pub mod db_operations;
