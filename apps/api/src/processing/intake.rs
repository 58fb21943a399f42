//! Resume batch intake: validates uploaded files and writes them to object
//! storage before the batch is submitted for processing.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::processing::submitter::StoredUpload;
use crate::storage::ResumeStorage;

const RESUME_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf"];
const ARCHIVE_CONTENT_TYPES: &[&str] = &["application/zip", "application/x-zip-compressed"];

/// One file part of the multipart request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    Archive { entries: Vec<String> },
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_resume_name(name: &str) -> bool {
    extension(name).is_some_and(|ext| RESUME_EXTENSIONS.contains(&ext.as_str()))
}

fn is_archive(file: &IncomingFile) -> bool {
    extension(&file.file_name).as_deref() == Some("zip")
        || ARCHIVE_CONTENT_TYPES.contains(&file.content_type.as_str())
}

/// Resume files inside a zip archive, skipping directories and metadata
/// folders that archivers add.
fn archive_entries(data: &[u8]) -> Result<Vec<String>, zip::result::ZipError> {
    let archive = zip::ZipArchive::new(Cursor::new(data))?;
    Ok(archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| !name.starts_with("__MACOSX/"))
        .filter(|name| {
            let base = name.rsplit('/').next().unwrap_or_default();
            !base.starts_with('.') && is_resume_name(base)
        })
        .map(str::to_string)
        .collect())
}

/// Classifies a file, rejecting anything that cannot hold a resume.
pub fn inspect_upload(file: &IncomingFile) -> Result<UploadKind, AppError> {
    if file.data.is_empty() {
        return Err(AppError::invalid_field(
            "file",
            format!("{} is empty", file.file_name),
        ));
    }

    if is_archive(file) {
        let mut entries = archive_entries(&file.data).map_err(|e| {
            warn!("Unreadable archive {}: {e}", file.file_name);
            AppError::invalid_field("file", format!("{} is not a readable zip archive", file.file_name))
        })?;
        if entries.is_empty() {
            return Err(AppError::invalid_field(
                "file",
                format!("{} contains no resume files", file.file_name),
            ));
        }
        entries.sort();
        return Ok(UploadKind::Archive { entries });
    }

    if is_resume_name(&file.file_name) {
        Ok(UploadKind::Resume)
    } else {
        Err(AppError::invalid_field(
            "file",
            format!(
                "{} has an unsupported type (expected {} or zip)",
                file.file_name,
                RESUME_EXTENSIONS.join(", ")
            ),
        ))
    }
}

/// Storage-safe base name: path components dropped, unusual characters
/// replaced with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Checks the whole batch, then uploads it under
/// `resumes/{organization}/{job}/{batch}/{index}-{name}`.
///
/// Nothing is written unless every file passes inspection, and a failed
/// write removes the objects already stored for the batch.
pub async fn store_batch(
    storage: &dyn ResumeStorage,
    organization_id: Uuid,
    job_id: Uuid,
    files: Vec<IncomingFile>,
    max_files: usize,
) -> Result<Vec<StoredUpload>, AppError> {
    if files.is_empty() {
        return Err(AppError::invalid_field("file", "at least one file is required"));
    }
    if files.len() > max_files {
        return Err(AppError::invalid_field(
            "file",
            format!("at most {max_files} files per batch"),
        ));
    }

    let kinds = files
        .iter()
        .map(inspect_upload)
        .collect::<Result<Vec<_>, _>>()?;

    let batch_id = Uuid::new_v4();
    let mut stored = Vec::with_capacity(files.len());
    for (index, (file, kind)) in files.into_iter().zip(kinds).enumerate() {
        let key = format!(
            "resumes/{organization_id}/{job_id}/{batch_id}/{index:03}-{}",
            sanitize_file_name(&file.file_name)
        );
        let size = file.data.len() as u64;
        if let Err(e) = storage
            .put_object(&key, file.data, &file.content_type)
            .await
        {
            discard_uploads(storage, &stored).await;
            return Err(e);
        }
        debug!(%key, size, "Stored resume upload");

        let (archive, entries) = match kind {
            UploadKind::Resume => (false, Vec::new()),
            UploadKind::Archive { entries } => (true, entries),
        };
        stored.push(StoredUpload {
            key,
            file_name: file.file_name,
            content_type: file.content_type,
            size,
            archive,
            entries,
        });
    }

    Ok(stored)
}

/// Best-effort removal of stored objects that will never be referenced.
/// Keys that cannot be deleted are logged for manual cleanup.
pub async fn discard_uploads(storage: &dyn ResumeStorage, uploads: &[StoredUpload]) {
    for upload in uploads {
        match storage.delete_object(&upload.key).await {
            Ok(()) => debug!(key = %upload.key, "Discarded resume upload"),
            Err(e) => error!(
                key = %upload.key,
                "Orphaned resume upload could not be removed: {e}"
            ),
        }
    }
}

#[cfg(test)]
pub(crate) fn zip_of(names: &[&str]) -> Bytes {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = || SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for name in names {
        if name.ends_with('/') {
            writer.add_directory(name.trim_end_matches('/'), options()).unwrap();
        } else {
            writer.start_file(*name, options()).unwrap();
            writer.write_all(b"resume body").unwrap();
        }
    }
    Bytes::from(writer.finish().unwrap().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryResumeStorage;

    fn file(name: &str, content_type: &str, data: Bytes) -> IncomingFile {
        IncomingFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data,
        }
    }

    fn pdf(name: &str) -> IncomingFile {
        file(name, "application/pdf", Bytes::from_static(b"%PDF-1.7"))
    }

    #[test]
    fn test_resume_extensions_are_case_insensitive() {
        assert_eq!(inspect_upload(&pdf("CV.PDF")).unwrap(), UploadKind::Resume);
        assert_eq!(
            inspect_upload(&file("cv.docx", "application/octet-stream", Bytes::from_static(b"x")))
                .unwrap(),
            UploadKind::Resume
        );
    }

    #[test]
    fn test_rejects_empty_and_unsupported_files() {
        assert!(inspect_upload(&file("cv.pdf", "application/pdf", Bytes::new())).is_err());
        assert!(inspect_upload(&file("photo.png", "image/png", Bytes::from_static(b"x"))).is_err());
    }

    #[test]
    fn test_archive_lists_resume_entries_only() {
        let data = zip_of(&[
            "batch/",
            "batch/alice.pdf",
            "batch/bob.docx",
            "batch/notes.png",
            "__MACOSX/batch/._alice.pdf",
            "batch/.DS_Store",
        ]);
        let kind = inspect_upload(&file("batch.zip", "application/zip", data)).unwrap();
        assert_eq!(
            kind,
            UploadKind::Archive {
                entries: vec!["batch/alice.pdf".to_string(), "batch/bob.docx".to_string()]
            }
        );
    }

    #[test]
    fn test_archive_without_resumes_is_rejected() {
        let data = zip_of(&["images/logo.png"]);
        assert!(inspect_upload(&file("batch.zip", "application/zip", data)).is_err());
    }

    #[test]
    fn test_corrupt_archive_is_rejected() {
        let corrupt = file("batch.zip", "application/zip", Bytes::from_static(b"not a zip"));
        assert!(matches!(
            inspect_upload(&corrupt),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\jo\\Jo Smith CV.pdf"), "Jo_Smith_CV.pdf");
        assert_eq!(sanitize_file_name(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_file_name("///"), "upload");
    }

    #[tokio::test]
    async fn test_store_batch_writes_every_file() {
        let storage = MemoryResumeStorage::default();
        let (org, job) = (Uuid::new_v4(), Uuid::new_v4());
        let files = vec![
            pdf("alice.pdf"),
            file("batch.zip", "application/zip", zip_of(&["bob.pdf"])),
        ];

        let stored = store_batch(&storage, org, job, files, 5).await.unwrap();

        assert_eq!(stored.len(), 2);
        assert!(stored[0].key.starts_with(&format!("resumes/{org}/{job}/")));
        assert!(stored[0].key.ends_with("/000-alice.pdf"));
        assert!(!stored[0].archive);
        assert!(stored[1].archive);
        assert_eq!(stored[1].entries, vec!["bob.pdf".to_string()]);
        assert_eq!(storage.keys().len(), 2);
    }

    #[tokio::test]
    async fn test_store_batch_is_all_or_nothing_on_validation() {
        let storage = MemoryResumeStorage::default();
        let files = vec![pdf("alice.pdf"), file("evil.exe", "application/octet-stream", Bytes::from_static(b"MZ"))];

        let result = store_batch(&storage, Uuid::new_v4(), Uuid::new_v4(), files, 5).await;

        assert!(result.is_err());
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_removes_earlier_objects_of_the_batch() {
        let storage = MemoryResumeStorage::failing_after(2);
        let files = vec![pdf("alice.pdf"), pdf("bob.pdf"), pdf("carol.pdf")];

        let result = store_batch(&storage, Uuid::new_v4(), Uuid::new_v4(), files, 5).await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_discard_uploads_removes_stored_objects() {
        let storage = MemoryResumeStorage::default();
        let stored = store_batch(
            &storage,
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![pdf("alice.pdf"), pdf("bob.pdf")],
            5,
        )
        .await
        .unwrap();
        assert_eq!(storage.keys().len(), 2);

        discard_uploads(&storage, &stored).await;

        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_store_batch_enforces_bounds() {
        let storage = MemoryResumeStorage::default();
        let none = store_batch(&storage, Uuid::new_v4(), Uuid::new_v4(), vec![], 5).await;
        assert!(none.is_err());

        let many = (0..6).map(|i| pdf(&format!("{i}.pdf"))).collect();
        let too_many = store_batch(&storage, Uuid::new_v4(), Uuid::new_v4(), many, 5).await;
        assert!(too_many.is_err());
    }
}
