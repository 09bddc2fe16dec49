use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Per-window document state: associated path, dirty flag, and the quit
/// re-entrancy guard. Owned by the host and passed into the coordinators;
/// nothing here lives in module scope.
#[derive(Debug, Default)]
pub struct DocumentSession {
    path: Option<PathBuf>,
    dirty: bool,
    quit_in_progress: bool,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_file(&self) -> bool {
        self.path.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Base directory of the current document, with a trailing separator,
    /// against which the editor resolves relative resource references.
    pub fn base_url(&self) -> Option<String> {
        self.path.as_deref().map(base_url)
    }

    /// Change notification from the editor: the document now has edits
    /// that disk does not.
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Associate a freshly opened file: path set, document clean.
    pub fn attach(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.dirty = false;
    }

    /// Retarget for save-as. Dirtiness is untouched until the write lands.
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// Back to an unsaved empty document.
    pub fn clear(&mut self) {
        self.path = None;
        self.dirty = false;
    }

    /// Begin quit handling. Returns false while a quit confirmation is
    /// already pending, so the handler cannot re-enter itself.
    pub fn begin_quit(&mut self) -> bool {
        if self.quit_in_progress {
            return false;
        }
        self.quit_in_progress = true;
        true
    }

    /// The user kept editing; quitting may be attempted again later.
    pub fn cancel_quit(&mut self) {
        self.quit_in_progress = false;
    }
}

/// Containing directory of `path`, always with a trailing separator.
pub fn base_url(path: &Path) -> String {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut base = dir.display().to_string();
    if !base.ends_with(MAIN_SEPARATOR) {
        base.push(MAIN_SEPARATOR);
    }
    base
}
