use std::path::{Path, PathBuf};
use std::time::Duration;

use mucore::dataimage;
use tokio::fs;

use crate::editor::EditorSurface;
use crate::error::{EditorError, ImageError, OpenError, SaveError};
use crate::images;
use crate::session::{base_url, DocumentSession};

const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Coordinates the open/save pipelines between the editor surface, the
/// session state, and the file system.
pub struct FileManager {
    backup_on_save: bool,
    large_file_warn_bytes: u64,
}

impl FileManager {
    pub fn new(backup_on_save: bool, large_file_warn_bytes: u64) -> Self {
        Self {
            backup_on_save,
            large_file_warn_bytes,
        }
    }

    /// Read `path` and hand its content to the editor together with the
    /// file's base directory, so sibling resources resolve. On success the
    /// session is associated with the path and clean.
    pub async fn open(
        &self,
        path: PathBuf,
        session: &mut DocumentSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<(), OpenError> {
        if !path.is_file() {
            return Err(OpenError::NotAFile { path });
        }

        match fs::metadata(&path).await {
            Ok(metadata) => {
                if metadata.len() > self.large_file_warn_bytes {
                    log::warn!(
                        "Large file detected ({} bytes): {}",
                        metadata.len(),
                        path.display()
                    );
                }
            }
            Err(e) => {
                log::warn!("Failed to get file metadata: {}", e);
            }
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| OpenError::Io {
                path: path.clone(),
                source,
            })?;
        if content.contains('\0') {
            return Err(OpenError::BinaryContent { path });
        }

        let base = base_url(&path);
        editor.set_html(&content, Some(&base)).await?;
        session.attach(path.clone());
        log::info!("Successfully opened file: {}", path.display());
        Ok(())
    }

    /// Full save pipeline against the session's associated path.
    ///
    /// Embedded images are externalized as sibling files and the document
    /// rewritten to reference them before the final content write. The
    /// per-image loop is best-effort: a failed or undecodable reference is
    /// recorded in the report, stays embedded, and does not stop the save.
    /// The dirty flag is cleared only after the content write succeeds.
    pub async fn save(
        &self,
        session: &mut DocumentSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<SaveReport, SaveError> {
        let path = session
            .file_path()
            .ok_or(SaveError::NoOpenPath)?
            .to_path_buf();
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut report = SaveReport::new(path.clone());

        // One reference at a time: each rewrite must land in the live
        // document before the next reference is inspected, and sequential
        // writes keep file naming deterministic.
        for reference in editor.data_images().await? {
            match dataimage::decode(&reference) {
                Ok(Some(image)) => match images::externalize(&directory, &image).await {
                    Ok(file_name) => {
                        editor.saved_data_image(&reference, &file_name).await?;
                        report.externalized += 1;
                    }
                    Err(error) => {
                        log::error!("Failed to externalize image: {}", error);
                        report.failures.push(ImageFailure::new(&reference, error));
                    }
                },
                Ok(None) => {
                    log::debug!("Leaving non-externalizable reference embedded");
                    report.skipped += 1;
                }
                Err(error) => {
                    log::warn!("Malformed embedded reference: {}", error);
                    report
                        .failures
                        .push(ImageFailure::new(&reference, error.into()));
                }
            }
        }

        let content = editor.get_html().await?;
        self.write_document(&path, &content).await?;
        report.bytes_written = content.len();
        session.mark_saved();
        log::info!("Successfully saved file: {}", path.display());
        Ok(report)
    }

    /// Save under a new path. The base directory changes with the path, so
    /// the content is re-set against the new base first — relative
    /// references must keep resolving inside the editor — then the normal
    /// save pipeline runs.
    pub async fn save_as(
        &self,
        path: PathBuf,
        session: &mut DocumentSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<SaveReport, SaveError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| SaveError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let content = editor.get_html().await?;
        editor.set_html(&content, Some(&base_url(&path))).await?;

        session.set_path(path);
        self.save(session, editor).await
    }

    /// Replace the current document with an empty one and drop the path
    /// association.
    pub async fn new_document(
        &self,
        session: &mut DocumentSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<(), EditorError> {
        editor.empty_document().await?;
        session.clear();
        log::info!("Started new document");
        Ok(())
    }

    async fn write_document(&self, path: &Path, content: &str) -> Result<(), SaveError> {
        // Keep the previous revision around before overwriting it.
        if self.backup_on_save && path.exists() {
            if let Ok(metadata) = fs::metadata(path).await {
                if metadata.len() > 0 {
                    let backup_path = path.with_extension("bak");
                    if let Err(e) = fs::copy(path, &backup_path).await {
                        log::warn!("Failed to create backup: {}", e);
                    } else {
                        log::debug!("Created backup: {}", backup_path.display());
                    }
                }
            }
        }

        let mut attempts = 0;
        loop {
            match fs::write(path, content.as_bytes()).await {
                Ok(()) => return Ok(()),
                Err(source) => {
                    attempts += 1;
                    if attempts >= MAX_WRITE_ATTEMPTS {
                        return Err(SaveError::Io {
                            path: path.to_path_buf(),
                            source,
                        });
                    }
                    log::warn!(
                        "Save attempt {} failed for {}, retrying...",
                        attempts,
                        path.display()
                    );
                    tokio::time::sleep(Duration::from_millis(100 * attempts as u64)).await;
                }
            }
        }
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new(true, 10 * 1024 * 1024)
    }
}

/// What one save pass did. The caller decides what to surface.
#[derive(Debug)]
pub struct SaveReport {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub externalized: usize,
    pub skipped: usize,
    pub failures: Vec<ImageFailure>,
}

impl SaveReport {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            bytes_written: 0,
            externalized: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line status for the host's message area.
    pub fn summary(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        let mut summary = format!("Wrote {} bytes to '{}'", self.bytes_written, name);
        if self.externalized > 0 {
            summary.push_str(&format!(", externalized {} image(s)", self.externalized));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} image(s) failed", self.failures.len()));
        }
        summary
    }
}

/// A reference that could not be externalized. The save still completes
/// and the reference stays embedded in the written document.
#[derive(Debug)]
pub struct ImageFailure {
    pub reference: String,
    pub error: ImageError,
}

impl ImageFailure {
    fn new(reference: &str, error: ImageError) -> Self {
        Self {
            reference: preview(reference),
            error,
        }
    }
}

/// Data references run to megabytes; keep only the identifying head.
fn preview(reference: &str) -> String {
    const PREVIEW_LEN: usize = 64;
    if reference.len() <= PREVIEW_LEN {
        return reference.to_string();
    }
    let mut end = PREVIEW_LEN;
    while !reference.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &reference[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::HeadlessEditor;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

    fn manager() -> FileManager {
        FileManager::default()
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_open_attaches_session_and_sets_base() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        std::fs::write(&path, "<p>Hello</p>").unwrap();

        let mut session = DocumentSession::new();
        let mut editor = HeadlessEditor::new();
        manager()
            .open(path.clone(), &mut session, &mut editor)
            .await
            .unwrap();

        assert_eq!(session.file_path(), Some(path.as_path()));
        assert!(!session.is_dirty());
        assert_eq!(editor.get_html().await.unwrap(), "<p>Hello</p>");
        let base = editor.base().unwrap().to_string();
        assert!(base.starts_with(dir.path().to_str().unwrap()));
        assert!(base.ends_with(std::path::MAIN_SEPARATOR));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut session = DocumentSession::new();
        let mut editor = HeadlessEditor::new();

        let result = manager()
            .open(dir.path().join("absent.html"), &mut session, &mut editor)
            .await;
        assert!(matches!(result, Err(OpenError::NotAFile { .. })));
        assert!(!session.has_file());
    }

    #[tokio::test]
    async fn test_open_rejects_binary_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        std::fs::write(&path, b"<p>\0</p>").unwrap();

        let mut session = DocumentSession::new();
        let mut editor = HeadlessEditor::new();
        let result = manager().open(path, &mut session, &mut editor).await;
        assert!(matches!(result, Err(OpenError::BinaryContent { .. })));
        assert!(!session.has_file());
    }

    #[tokio::test]
    async fn test_round_trip_without_images_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let content = "<h1>Title</h1>\n<p>Body with 'quotes' and \"more\".</p>\n";
        std::fs::write(&path, content).unwrap();

        let mut session = DocumentSession::new();
        let mut editor = HeadlessEditor::new();
        let fm = manager();
        fm.open(path.clone(), &mut session, &mut editor)
            .await
            .unwrap();
        fm.save(&mut session, &mut editor).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_save_externalizes_embedded_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let reference = dataimage::encode(PNG_BYTES, "image/png");

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        session.mark_changed();
        let mut editor =
            HeadlessEditor::with_content(&format!(r#"<p><img src="{reference}"></p>"#));

        let report = manager().save(&mut session, &mut editor).await.unwrap();
        assert_eq!(report.externalized, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.is_clean());
        assert!(!session.is_dirty());

        // The document plus exactly one new image file.
        assert_eq!(file_count(dir.path()), 2);
        let image_name = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .find(|name| name.ends_with(".png"))
            .expect("externalized png");

        let written = std::fs::read(dir.path().join(&image_name)).unwrap();
        assert_eq!(written, PNG_BYTES);

        // The saved markup references the bare file name, not a path.
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, format!(r#"<p><img src="{image_name}"></p>"#));
        assert!(!saved.contains("data:"));
    }

    #[tokio::test]
    async fn test_jpeg_extension_is_not_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let reference = dataimage::encode(&[1, 2], "image/jpeg");

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        let mut editor = HeadlessEditor::with_content(&format!(r#"<img src="{reference}">"#));

        manager().save(&mut session, &mut editor).await.unwrap();
        let has_jpeg = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name().to_string_lossy().ends_with(".jpeg"));
        assert!(has_jpeg);
    }

    #[tokio::test]
    async fn test_unsupported_media_type_stays_embedded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let reference = dataimage::encode(b"%PDF-1.4", "application/pdf");
        let content = format!(r#"<img src="{reference}">"#);

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        let mut editor = HeadlessEditor::with_content(&content);

        let report = manager().save(&mut session, &mut editor).await.unwrap();
        assert_eq!(report.externalized, 0);
        assert_eq!(report.skipped, 1);
        assert!(report.is_clean());

        // Only the document itself; the reference is untouched.
        assert_eq!(file_count(dir.path()), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_malformed_reference_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let good = dataimage::encode(PNG_BYTES, "image/png");
        let content = format!(r#"<img src="data:image/png;base64"><img src="{good}">"#);

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        session.mark_changed();
        let mut editor = HeadlessEditor::with_content(&content);

        let report = manager().save(&mut session, &mut editor).await.unwrap();
        assert_eq!(report.externalized, 1);
        assert_eq!(report.failures.len(), 1);
        // The content write still happened and the session is clean.
        assert!(!session.is_dirty());
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("data:image/png;base64\""));
    }

    #[tokio::test]
    async fn test_save_without_path_is_rejected() {
        let mut session = DocumentSession::new();
        let mut editor = HeadlessEditor::new();
        let result = manager().save(&mut session, &mut editor).await;
        assert!(matches!(result, Err(SaveError::NoOpenPath)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_dirty_set() {
        let dir = TempDir::new().unwrap();
        // The session path is a directory, so the content write must fail.
        let mut session = DocumentSession::new();
        session.attach(dir.path().to_path_buf());
        session.mark_changed();
        let mut editor = HeadlessEditor::with_content("<p>doomed</p>");

        let result = FileManager::new(false, 10 * 1024 * 1024)
            .save(&mut session, &mut editor)
            .await;
        assert!(matches!(result, Err(SaveError::Io { .. })));
        assert!(session.is_dirty());
    }

    #[tokio::test]
    async fn test_second_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        let reference = dataimage::encode(PNG_BYTES, "image/png");

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        let mut editor =
            HeadlessEditor::with_content(&format!(r#"<p><img src="{reference}"></p>"#));

        let fm = FileManager::new(false, 10 * 1024 * 1024);
        fm.save(&mut session, &mut editor).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        let files_after_first = file_count(dir.path());

        let report = fm.save(&mut session, &mut editor).await.unwrap();
        assert_eq!(report.externalized, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
        assert_eq!(file_count(dir.path()), files_after_first);
    }

    #[tokio::test]
    async fn test_save_creates_backup_of_previous_revision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.html");
        std::fs::write(&path, "<p>old</p>").unwrap();

        let mut session = DocumentSession::new();
        session.attach(path.clone());
        let mut editor = HeadlessEditor::with_content("<p>new</p>");

        manager().save(&mut session, &mut editor).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>new</p>");
        assert_eq!(
            std::fs::read_to_string(path.with_extension("bak")).unwrap(),
            "<p>old</p>"
        );
    }

    #[tokio::test]
    async fn test_save_as_rebases_and_writes_beside_new_path() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("exported").join("doc.html");
        let reference = dataimage::encode(PNG_BYTES, "image/png");

        let mut session = DocumentSession::new();
        session.mark_changed();
        let mut editor =
            HeadlessEditor::with_content(&format!(r#"<p><img src="{reference}"></p>"#));

        let report = manager()
            .save_as(target.clone(), &mut session, &mut editor)
            .await
            .unwrap();
        assert_eq!(report.externalized, 1);
        assert_eq!(session.file_path(), Some(target.as_path()));
        assert!(!session.is_dirty());

        // Content was re-set against the new base before saving.
        let base = editor.base().unwrap();
        assert!(base.starts_with(target.parent().unwrap().to_str().unwrap()));

        // The image landed beside the new document.
        assert_eq!(file_count(target.parent().unwrap()), 2);
    }
}
