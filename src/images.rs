use std::{io::Cursor, path::Path, sync::Arc};

use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Formats the guide and term-recommendation pickers accept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UploadFormat {
    Png,
    Jpeg,
    Webp,
}

impl UploadFormat {
    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(UploadFormat::Png),
            ImageFormat::Jpeg => Some(UploadFormat::Jpeg),
            ImageFormat::WebP => Some(UploadFormat::Webp),
            _ => None,
        }
    }
}

/// A screenshot uploaded for guide generation or term recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub name: String,
    pub format: UploadFormat,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Arc<Vec<u8>>,
}

impl PartialEq for ImageUpload {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.format == other.format
            && self.width == other.width
            && self.height == other.height
    }
}

impl ImageUpload {
    /// Sniffs the bytes rather than trusting the extension.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let format = image::guess_format(&bytes)
            .map_err(|_| WorkflowError::UnsupportedImage(name.clone()))?;
        let format = UploadFormat::from_image_format(format)
            .ok_or_else(|| WorkflowError::UnsupportedImage(name.clone()))?;

        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .with_context(|| format!("failed to read image header for {name}"))?
            .into_dimensions()
            .map_err(|_| WorkflowError::UnsupportedImage(name.clone()))?;

        Ok(Self {
            name,
            format,
            width,
            height,
            bytes: Arc::new(bytes),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::workflow_error;

    #[test]
    fn png_is_accepted_with_dimensions() {
        let upload = ImageUpload::from_bytes("shot.png", sample_png(4, 3)).unwrap();
        assert_eq!(upload.format, UploadFormat::Png);
        assert_eq!((upload.width, upload.height), (4, 3));
    }

    #[test]
    fn extension_is_not_trusted() {
        let upload = ImageUpload::from_bytes("shot.jpg", sample_png(1, 1)).unwrap();
        assert_eq!(upload.format, UploadFormat::Png);
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let err = ImageUpload::from_bytes("notes.txt", b"hello world".to_vec()).unwrap_err();
        assert_eq!(
            workflow_error(&err),
            Some(&WorkflowError::UnsupportedImage("notes.txt".into()))
        );
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.png");
        std::fs::write(&path, sample_png(2, 2)).unwrap();

        let upload = ImageUpload::from_path(&path).unwrap();
        assert_eq!(upload.name, "ui.png");
    }
}
