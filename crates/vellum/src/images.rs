use std::path::Path;

use mucore::dataimage::{self, DataImage};
use tokio::fs;
use uuid::Uuid;

use crate::editor::EditorSurface;
use crate::error::ImageError;

/// Write a decoded embedded image as a standalone file in `directory` and
/// return the bare file name. Callers relativize against the document's
/// base directory; this layer never deletes what it wrote here.
pub async fn externalize(directory: &Path, image: &DataImage) -> Result<String, ImageError> {
    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    let target = directory.join(&file_name);
    fs::write(&target, &image.payload)
        .await
        .map_err(|source| ImageError::Io {
            path: target.clone(),
            source,
        })?;
    log::debug!("Externalized embedded image to {}", target.display());
    Ok(file_name)
}

/// Host signal: the user picked an image file to insert. Classify it by
/// extension, embed the bytes as a self-describing reference, and hand the
/// reference to the editor. Returns the picked file's name for the status
/// line.
pub async fn insert_image_from_path(
    path: &Path,
    editor: &mut dyn EditorSurface,
) -> Result<String, ImageError> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let media_type = dataimage::media_type_for_extension(extension)
        .ok_or_else(|| ImageError::UnsupportedMediaType(extension.to_string()))?;

    let payload = fs::read(path).await.map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reference = dataimage::encode(&payload, media_type);
    editor.insert_image(&reference).await?;
    log::info!("Inserted image from {}", path.display());

    Ok(path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default())
}
