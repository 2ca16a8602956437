use crate::{App, AppView, config, file_preview, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

pub(crate) struct FileManager<'a> {
    app: &'a mut App,
}

impl<'a> FileManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    /// Open the note browser over the configured notes directory.
    pub(crate) fn show_browser(app: &mut App) {
        app.browser_entries = file_preview::list_note_files(&config::notes_dir());
        app.browser_index = 0;
        app.view = AppView::FileBrowser;
        log_debug(&format!(
            "App: browsing {} note file(s)",
            app.browser_entries.len()
        ));
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => self.app.quit(),
            (KeyModifiers::NONE, KeyCode::Esc | KeyCode::Char('m')) => self.close_browser(),
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.select_next(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.select_previous(),
            (KeyModifiers::NONE, KeyCode::Enter) => self.choose_current(),
            (KeyModifiers::NONE, KeyCode::Char('x')) => self.clear_selection(),
            _ => {}
        }
    }

    fn close_browser(&mut self) {
        self.app.view = AppView::Workspace;
    }

    fn select_next(&mut self) {
        let total = self.app.browser_entries.len();
        if total == 0 {
            self.app.browser_index = 0;
            return;
        }
        self.app.browser_index = (self.app.browser_index + 1) % total;
    }

    fn select_previous(&mut self) {
        let total = self.app.browser_entries.len();
        if total == 0 {
            self.app.browser_index = 0;
            return;
        }
        self.app.browser_index = if self.app.browser_index == 0 {
            total - 1
        } else {
            self.app.browser_index - 1
        };
    }

    fn choose_current(&mut self) {
        let Some(path) = self
            .app
            .browser_entries
            .get(self.app.browser_index)
            .cloned()
        else {
            return;
        };
        Self::select_file(self.app, path);
        self.app.view = AppView::Workspace;
    }

    /// Make `path` the selected note and start loading its preview. Previews
    /// only exist for text files; everything else gets a placeholder. Any
    /// preview read still pending for an earlier selection is dropped.
    pub(crate) fn select_file(app: &mut App, path: PathBuf) {
        app.preview_receiver = None;
        app.file_status = Some(format!("Selected: {}", file_preview::file_label(&path)));
        if file_preview::is_text_file(&path) {
            file_preview::trigger_preview_load(app, path.clone());
        } else {
            app.file_preview = Some(file_preview::NON_TEXT_PLACEHOLDER.to_string());
        }
        app.selected_file = Some(path);
    }

    /// Drop the selection along with its status, preview, and pending read.
    fn clear_selection(&mut self) {
        self.app.selected_file = None;
        self.app.file_status = None;
        self.app.file_preview = None;
        self.app.preview_receiver = None;
        log_debug("App: cleared note selection");
    }

    /// Fold a completed preview read into the file pane.
    pub(crate) fn apply_preview(app: &mut App, content: String) {
        app.file_preview = Some(content);
    }
}
