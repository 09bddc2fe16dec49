use mucore::keymap::Platform;
use mucore::menu::{self, Command, MenuConfig, MenuGroup};

use crate::config::Config;
use crate::dialogs::DialogService;
use crate::editor::EditorSurface;
use crate::error::{EditorError, ImageError, OpenError, SaveError};
use crate::file_manager::{FileManager, SaveReport};
use crate::images;
use crate::session::DocumentSession;

/// One window's worth of application state: the session, the coordinators,
/// and the host-supplied editor and dialog capabilities. The host event
/// loop awaits one operation at a time, so no two flows ever overlap.
pub struct App {
    pub session: DocumentSession,
    pub config: Config,
    file_manager: FileManager,
    editor: Box<dyn EditorSurface>,
    dialogs: Box<dyn DialogService>,
    menu: Vec<MenuGroup>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        editor: Box<dyn EditorSurface>,
        dialogs: Box<dyn DialogService>,
    ) -> Self {
        let file_manager = FileManager::new(config.backup_on_save, config.large_file_warn_bytes);
        Self {
            session: DocumentSession::new(),
            file_manager,
            editor,
            dialogs,
            menu: Vec::new(),
            should_quit: false,
            config,
        }
    }

    /// One-time editor-ready signal carrying the editor's configuration
    /// value. The command menu is derived from it and stays fixed for the
    /// session.
    pub fn handle_editor_ready(&mut self, config_json: &str) -> Result<(), serde_json::Error> {
        let menu_config = MenuConfig::from_json(config_json)?;
        let platform = self.config.keymap_platform.unwrap_or_else(Platform::current);
        self.menu = menu::build(&menu_config, platform);
        log::info!("Editor ready; built {} menu groups", self.menu.len());
        Ok(())
    }

    pub fn menu(&self) -> &[MenuGroup] {
        &self.menu
    }

    /// Change notification from the editor delegate.
    pub fn handle_changed(&mut self) {
        self.session.mark_changed();
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Unsaved-changes confirmation shared by open, new-document, and quit.
    /// Auto-approves when the editor reports no unsaved changes.
    async fn confirm_discard(&mut self) -> Result<bool, EditorError> {
        if !self.editor.is_changed().await? {
            return Ok(true);
        }
        let name = self.session.display_name();
        Ok(self.dialogs.confirm_discard(&name).await)
    }

    /// Let the user pick a document and load it. Declining to discard
    /// changes or dismissing the dialog aborts with no state change.
    pub async fn open_document(&mut self) -> Result<String, OpenError> {
        if !self.confirm_discard().await? {
            return Err(OpenError::Cancelled);
        }
        let Some(path) = self.dialogs.pick_open_path().await else {
            return Err(OpenError::Cancelled);
        };
        self.file_manager
            .open(path, &mut self.session, self.editor.as_mut())
            .await?;
        Ok(format!("Opened '{}'", self.session.display_name()))
    }

    pub async fn new_document(&mut self) -> Result<String, OpenError> {
        if !self.confirm_discard().await? {
            return Err(OpenError::Cancelled);
        }
        self.file_manager
            .new_document(&mut self.session, self.editor.as_mut())
            .await?;
        Ok("New document".to_string())
    }

    /// Save to the associated path, or fall through to save-as when the
    /// document has never been saved.
    pub async fn save_document(&mut self) -> Result<String, SaveError> {
        if !self.session.has_file() {
            return self.save_document_as().await;
        }
        let report = self
            .file_manager
            .save(&mut self.session, self.editor.as_mut())
            .await?;
        Ok(Self::report_status(report))
    }

    pub async fn save_document_as(&mut self) -> Result<String, SaveError> {
        let Some(path) = self.dialogs.pick_save_path().await else {
            return Err(SaveError::Cancelled);
        };
        let report = self
            .file_manager
            .save_as(path, &mut self.session, self.editor.as_mut())
            .await?;
        Ok(Self::report_status(report))
    }

    /// Host signal: let the user choose an image file to insert into the
    /// document as an embedded reference.
    pub async fn insert_image(&mut self) -> Result<String, ImageError> {
        let Some(path) = self.dialogs.pick_image_path().await else {
            return Err(ImageError::Cancelled);
        };
        let file_name = images::insert_image_from_path(&path, self.editor.as_mut()).await?;
        Ok(format!("Inserted '{file_name}'"))
    }

    /// Quit request. Re-entrant calls while the confirmation prompt is
    /// still open are ignored; cancelling the prompt resets the guard.
    /// Returns whether quitting may proceed.
    pub async fn request_quit(&mut self) -> Result<bool, EditorError> {
        if !self.session.begin_quit() {
            return Ok(false);
        }
        let approved = match self.confirm_discard().await {
            Ok(approved) => approved,
            Err(error) => {
                self.session.cancel_quit();
                return Err(error);
            }
        };
        if approved {
            self.should_quit = true;
        } else {
            self.session.cancel_quit();
        }
        Ok(approved)
    }

    /// Dispatch a menu command to the editor.
    pub async fn perform(&mut self, command: Command) -> Result<(), EditorError> {
        self.editor.perform(command).await
    }

    fn report_status(report: SaveReport) -> String {
        for failure in &report.failures {
            log::warn!(
                "Image left embedded ({}): {}",
                failure.reference,
                failure.error
            );
        }
        report.summary()
    }
}
