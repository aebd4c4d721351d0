use actix_multipart::Multipart;
use actix_web::{web, web::BytesMut};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Per-file cap matching the original upload policy.
const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Securely maps a validated MIME type to a safe file extension. The list is
/// intentionally fixed: images and the document formats citizens attach.
fn mime_to_safe_extension(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        _ => None,
    }
}

/// A multipart file streamed to disk: where it landed, and the `/uploads/...`
/// path stored on documents and served statically.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub disk_path: PathBuf,
    pub url_path: String,
}

/// Drains a multipart payload. Parts named `file_field` are streamed to the
/// uploads directory under collision-resistant generated names; every other
/// part is collected as a text field. On any failure the files written so far
/// are removed, so the caller never sees a half-saved batch.
pub async fn collect_multipart(
    uploads_dir: &Path,
    mut payload: Multipart,
    file_field: &str,
    max_files: usize,
) -> Result<(HashMap<String, String>, Vec<SavedFile>), Box<dyn std::error::Error>> {
    let mut text_fields = HashMap::new();
    let mut saved_files = Vec::new();

    match collect_inner(
        uploads_dir,
        &mut payload,
        file_field,
        max_files,
        &mut text_fields,
        &mut saved_files,
    )
    .await
    {
        Ok(()) => Ok((text_fields, saved_files)),
        Err(e) => {
            remove_saved_files(&saved_files);
            Err(e)
        }
    }
}

async fn collect_inner(
    uploads_dir: &Path,
    payload: &mut Multipart,
    file_field: &str,
    max_files: usize,
    text_fields: &mut HashMap<String, String>,
    saved_files: &mut Vec<SavedFile>,
) -> Result<(), Box<dyn std::error::Error>> {
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        if field_name == file_field {
            // A file input submitted empty arrives as a part with no
            // filename; drain and ignore it.
            let has_filename = field
                .content_disposition()
                .get_filename()
                .map(|name| !name.is_empty())
                .unwrap_or(false);
            if !has_filename {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
                continue;
            }

            if saved_files.len() >= max_files {
                return Err(format!(
                    "At most {} file(s) may be uploaded in one request.",
                    max_files
                )
                .into());
            }

            let content_type = field.content_type().ok_or("Content-Type not available.")?;
            let content_type_str = content_type.to_string();
            let extension = mime_to_safe_extension(&content_type_str).ok_or_else(|| {
                format!("Unsupported file type: '{}'.", content_type_str)
            })?;

            let file_id = Uuid::new_v4();
            let file_name = format!("{}.{}", file_id, extension);
            let final_path = uploads_dir.join(&file_name);

            // All blocking filesystem work goes through web::block.
            web::block({
                let dir = uploads_dir.to_path_buf();
                move || fs::create_dir_all(&dir)
            })
            .await??;

            let mut f = web::block({
                let path = final_path.clone();
                move || fs::File::create(path)
            })
            .await??;

            let mut file_size: u64 = 0;
            while let Some(chunk) = field.next().await {
                let data = chunk?;
                file_size += data.len() as u64;
                if file_size > MAX_FILE_SIZE_BYTES {
                    drop(f);
                    let _ = fs::remove_file(&final_path);
                    return Err("File is too large. Maximum size is 10MB.".into());
                }
                f = web::block(move || f.write_all(&data).map(|_| f)).await??;
            }

            saved_files.push(SavedFile {
                disk_path: final_path,
                url_path: format!("/uploads/{}", file_name),
            });
        } else {
            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                data.extend_from_slice(&chunk?);
            }
            let value = String::from_utf8(data.to_vec())
                .map_err(|_| "Invalid UTF-8 in form field.")?;
            text_fields.insert(field_name, value);
        }
    }

    Ok(())
}

/// Best-effort removal of uploaded files on error exit paths (for example, a
/// media upload whose target project turned out not to exist).
pub fn remove_saved_files(files: &[SavedFile]) {
    for file in files {
        if let Err(e) = fs::remove_file(&file.disk_path) {
            log::warn!(
                "Failed to remove uploaded file '{}': {}",
                file.disk_path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_allowed_mime_types_map_to_extensions() {
        assert_eq!(mime_to_safe_extension("image/jpeg"), Some("jpg"));
        assert_eq!(mime_to_safe_extension("application/pdf"), Some("pdf"));
        assert_eq!(
            mime_to_safe_extension(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            Some("docx")
        );
        assert_eq!(mime_to_safe_extension("video/mp4"), None);
        assert_eq!(mime_to_safe_extension("text/html"), None);
    }

    #[test]
    fn remove_saved_files_tolerates_missing_files() {
        remove_saved_files(&[SavedFile {
            disk_path: PathBuf::from("/nonexistent/upload.jpg"),
            url_path: "/uploads/upload.jpg".to_string(),
        }]);
    }
}
