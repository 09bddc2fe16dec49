use async_trait::async_trait;
use mucore::dataimage;
use mucore::menu::Command;

use crate::error::EditorError;

/// Capability surface of the embedded rich-text editing view.
///
/// The host drives the editor exclusively through these calls; content
/// crosses the boundary verbatim, so no quote or line-terminator escaping
/// exists anywhere in this layer.
#[async_trait]
pub trait EditorSurface: Send {
    /// Full serialized markup of the current document.
    async fn get_html(&mut self) -> Result<String, EditorError>;

    /// Replace the document. `base`, when present, is the document's base
    /// directory with a trailing separator, used to resolve relative
    /// resource references.
    async fn set_html(&mut self, content: &str, base: Option<&str>) -> Result<(), EditorError>;

    async fn empty_document(&mut self) -> Result<(), EditorError>;

    /// Whether the editor holds edits not yet persisted.
    async fn is_changed(&mut self) -> Result<bool, EditorError>;

    /// Ordered embedded-image references currently present in the document.
    async fn data_images(&mut self) -> Result<Vec<String>, EditorError>;

    /// Rewrite every occurrence of `old_ref` to point at `file_name`.
    async fn saved_data_image(&mut self, old_ref: &str, file_name: &str)
        -> Result<(), EditorError>;

    /// Insert an image by reference at the current selection.
    async fn insert_image(&mut self, src: &str) -> Result<(), EditorError>;

    /// Invoke one formatting/style/list/table/search operation.
    async fn perform(&mut self, command: Command) -> Result<(), EditorError>;
}

/// In-memory editor backing the headless binary and the test suite.
///
/// It stores the document verbatim and answers the same capability surface
/// the embedded editing view exposes; formatting commands are recorded
/// rather than applied.
#[derive(Debug, Default)]
pub struct HeadlessEditor {
    html: String,
    base: Option<String>,
    changed: bool,
    performed: Vec<Command>,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn performed(&self) -> &[Command] {
        &self.performed
    }
}

#[async_trait]
impl EditorSurface for HeadlessEditor {
    async fn get_html(&mut self) -> Result<String, EditorError> {
        Ok(self.html.clone())
    }

    async fn set_html(&mut self, content: &str, base: Option<&str>) -> Result<(), EditorError> {
        self.html = content.to_string();
        self.base = base.map(str::to_string);
        self.changed = false;
        Ok(())
    }

    async fn empty_document(&mut self) -> Result<(), EditorError> {
        self.html.clear();
        self.base = None;
        self.changed = false;
        Ok(())
    }

    async fn is_changed(&mut self) -> Result<bool, EditorError> {
        Ok(self.changed)
    }

    async fn data_images(&mut self) -> Result<Vec<String>, EditorError> {
        Ok(dataimage::find_data_images(&self.html))
    }

    async fn saved_data_image(
        &mut self,
        old_ref: &str,
        file_name: &str,
    ) -> Result<(), EditorError> {
        self.html = self.html.replace(old_ref, file_name);
        Ok(())
    }

    async fn insert_image(&mut self, src: &str) -> Result<(), EditorError> {
        self.html.push_str(&format!(r#"<p><img src="{src}"></p>"#));
        self.changed = true;
        Ok(())
    }

    async fn perform(&mut self, command: Command) -> Result<(), EditorError> {
        self.performed.push(command);
        self.changed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_html_resets_changed() {
        let mut editor = HeadlessEditor::new();
        editor.perform(Command::Bold).await.unwrap();
        assert!(editor.is_changed().await.unwrap());

        editor.set_html("<p>Hi</p>", Some("/docs/")).await.unwrap();
        assert!(!editor.is_changed().await.unwrap());
        assert_eq!(editor.base(), Some("/docs/"));
        assert_eq!(editor.get_html().await.unwrap(), "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_saved_data_image_rewrites_every_occurrence() {
        let reference = dataimage::encode(&[7, 7, 7], "image/png");
        let html = format!(r#"<img src="{reference}"><p>x</p><img src="{reference}">"#);
        let mut editor = HeadlessEditor::with_content(&html);

        assert_eq!(editor.data_images().await.unwrap(), vec![reference.clone()]);

        editor
            .saved_data_image(&reference, "pic.png")
            .await
            .unwrap();
        assert_eq!(
            editor.get_html().await.unwrap(),
            r#"<img src="pic.png"><p>x</p><img src="pic.png">"#
        );
        assert!(editor.data_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_image_marks_changed() {
        let mut editor = HeadlessEditor::new();
        editor
            .insert_image("data:image/png;base64,AA==")
            .await
            .unwrap();
        assert!(editor.is_changed().await.unwrap());
        assert!(editor
            .get_html()
            .await
            .unwrap()
            .contains("data:image/png;base64,AA=="));
    }
}
