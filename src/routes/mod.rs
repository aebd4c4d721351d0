pub mod issues;
pub mod post;
pub mod project;
pub mod task;
