use std::path::PathBuf;

use async_trait::async_trait;

/// File dialogs and confirmation prompts are owned by the host shell; the
/// core only sees their outcome. `None` means the user cancelled, which
/// short-circuits the surrounding operation with no state change.
#[async_trait]
pub trait DialogService: Send {
    async fn pick_open_path(&mut self) -> Option<PathBuf>;

    async fn pick_save_path(&mut self) -> Option<PathBuf>;

    async fn pick_image_path(&mut self) -> Option<PathBuf>;

    /// Ask whether unsaved changes in `document_name` may be discarded.
    async fn confirm_discard(&mut self, document_name: &str) -> bool;
}
