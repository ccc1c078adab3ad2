use std::{fs, path::PathBuf};

use log::warn;

use crate::models::FileInput;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];
pub const MAX_FILES_PER_PICK: usize = 10;

fn is_accepted(path: &PathBuf) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// Applies the document picker's accept list and file cap, then stats each
/// survivor. Unreadable paths are skipped with a warning.
pub fn document_inputs(paths: Vec<PathBuf>) -> Vec<FileInput> {
    paths
        .into_iter()
        .filter(is_accepted)
        .take(MAX_FILES_PER_PICK)
        .filter_map(|path| {
            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!("skipping {}: {err}", path.display());
                    return None;
                }
            };
            let name = path.file_name()?.to_string_lossy().into_owned();
            Some(FileInput {
                name,
                size,
                path: Some(path),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_documents_only_and_caps_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for idx in 0..12 {
            let path = dir.path().join(format!("doc{idx:02}.PDF"));
            fs::write(&path, b"%PDF-1.4").unwrap();
            paths.push(path);
        }
        let image = dir.path().join("photo.png");
        fs::write(&image, b"png").unwrap();
        paths.insert(0, image);

        let inputs = document_inputs(paths);
        assert_eq!(inputs.len(), MAX_FILES_PER_PICK);
        assert_eq!(inputs[0].name, "doc00.PDF");
        assert_eq!(inputs[0].size, 8);
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = document_inputs(vec![dir.path().join("gone.docx")]);
        assert!(inputs.is_empty());
    }
}
