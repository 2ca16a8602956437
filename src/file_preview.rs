use crate::{App, log_util::log_debug};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

/// Shown in the preview pane for selected files that cannot be read as text.
pub const NON_TEXT_PLACEHOLDER: &str =
    "📄 File selected. Preview only available for .txt files.";

/// True when the file can be previewed inline.
pub fn is_text_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("txt")
    )
}

/// Display name for a note file.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Regular files directly under `dir`, sorted by path. A missing directory
/// yields an empty listing rather than an error.
pub fn list_note_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = match collect_files(dir) {
        Ok(files) => files,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            log_debug(&format!(
                "failed to list notes in {}: {}",
                dir.display(),
                err
            ));
            Vec::new()
        }
    };
    files.sort();
    files
}

fn collect_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.metadata()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Read the selected note off the UI thread and deliver it through the
/// preview channel. Starting a new load replaces the receiver, so a
/// superseded read delivers into a closed channel and is dropped.
pub(crate) fn trigger_preview_load(app: &mut App, path: PathBuf) {
    let (sender, receiver) = mpsc::channel();
    app.preview_receiver = Some(receiver);
    log_debug(&format!("FilePreview: loading {}", path.display()));

    thread::spawn(move || {
        let content = load_preview(&path);
        let _ = sender.send(content);
    });
}

/// Read a note for the preview pane. Unreadable files preview as empty; the
/// failure goes to the debug log.
pub fn load_preview(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            log_debug(&format!("failed to preview {}: {}", path.display(), err));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_detection_is_extension_based() {
        assert!(is_text_file(Path::new("notes/alpha.txt")));
        assert!(is_text_file(Path::new("notes/ALPHA.TXT")));
        assert!(!is_text_file(Path::new("notes/alpha.md")));
        assert!(!is_text_file(Path::new("notes/alpha.pdf")));
        assert!(!is_text_file(Path::new("notes/txt")));
    }

    #[test]
    fn file_label_is_the_basename() {
        assert_eq!(file_label(Path::new("notes/deep/alpha.txt")), "alpha.txt");
    }

    #[test]
    fn listing_is_sorted_and_skips_directories() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("beta.txt"), "b").expect("write beta");
        fs::write(dir.path().join("alpha.txt"), "a").expect("write alpha");
        fs::create_dir(dir.path().join("nested")).expect("create nested dir");

        let files = list_note_files(dir.path());
        assert_eq!(
            files,
            vec![dir.path().join("alpha.txt"), dir.path().join("beta.txt")]
        );
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert!(list_note_files(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn preview_reads_file_content() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("alpha.txt");
        fs::write(&path, "line one\nline two\n").expect("write note");
        assert_eq!(load_preview(&path), "line one\nline two\n");
    }

    #[test]
    fn unreadable_preview_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert_eq!(load_preview(&dir.path().join("absent.txt")), "");
    }
}
