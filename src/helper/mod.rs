pub mod form_helpers;
pub mod media_helpers;
