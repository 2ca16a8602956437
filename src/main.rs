mod api_client;
mod config;
mod export_manager;
mod file_preview;
mod log_util;
mod quiz;
mod ui_renderer;
mod view_managers;

use api_client::ApiClient;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dotenvy::dotenv;
use log_util::log_debug;
use quiz::{QuizForm, QuizQuestion, QuizState, ScoreReport};
use ratatui::{DefaultTerminal, Frame};
use std::{
    path::PathBuf,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};
use ui_renderer::UiRenderer;
use view_managers::{FileManager, QuizManager, SidebarManager};

pub(crate) const LOADING_FRAMES: [&str; 4] = ["-", "\\", "|", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppView {
    Workspace,
    FileBrowser,
}

/// Which workspace pane receives plain key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FocusTarget {
    QuestionCount,
    AskInput,
    QuizList,
}

#[derive(Debug)]
pub(crate) enum AskTaskMessage {
    Success(String),
    Error(String),
}

#[derive(Debug)]
pub(crate) enum QuizTaskMessage {
    Success(Vec<QuizQuestion>),
    Error(String),
}

fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = App::new().run(terminal);
    ratatui::restore();
    result
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub(crate) running: bool,
    /// Current view being displayed.
    pub(crate) view: AppView,
    /// Pane that receives plain key input in the workspace view.
    pub(crate) focus: FocusTarget,
    /// Whether the sidebar is hidden, mirroring the persisted setting.
    pub(crate) sidebar_collapsed: bool,
    /// Number of questions the next generate call will request.
    pub(crate) question_count: u16,
    /// Question text being composed in the ask box.
    pub(crate) ask_input: String,
    /// Most recent answer returned by the server.
    pub(crate) answer: Option<String>,
    /// Status line for the ask box.
    pub(crate) op_status: Option<String>,
    /// Indicates whether an ask request is currently running.
    pub(crate) ask_in_flight: bool,
    /// Receives the background ask result.
    pub(crate) ask_receiver: Option<Receiver<AskTaskMessage>>,
    /// Files offered by the note browser.
    pub(crate) browser_entries: Vec<PathBuf>,
    /// Currently highlighted browser entry.
    pub(crate) browser_index: usize,
    /// Note file chosen for previewing, if any.
    pub(crate) selected_file: Option<PathBuf>,
    /// Status line for the file pane.
    pub(crate) file_status: Option<String>,
    /// Preview content for the selected note.
    pub(crate) file_preview: Option<String>,
    /// Receives preview content loaded in the background.
    pub(crate) preview_receiver: Option<Receiver<String>>,
    /// Questions from the most recent successful generation.
    pub(crate) quiz: Option<QuizState>,
    /// Rendered form the user answers; rebuilt whenever the quiz changes.
    pub(crate) form: QuizForm,
    /// Outcome of the most recent grading pass.
    pub(crate) results: Option<ScoreReport>,
    /// Currently highlighted question in the quiz list.
    pub(crate) current_question: usize,
    /// Status line for the quiz pane.
    pub(crate) quiz_status: Option<String>,
    /// Indicates whether a generate request is currently running.
    pub(crate) quiz_generating: bool,
    /// Question count captured when the running generate started.
    pub(crate) generating_count: u16,
    /// Receives the background quiz generation result.
    pub(crate) quiz_receiver: Option<Receiver<QuizTaskMessage>>,
    /// Spinner frame index for the active loading indicators.
    pub(crate) loading_frame: usize,
    /// JSON client for the configured quiz server.
    pub(crate) api_client: ApiClient,
    /// Any error encountered while loading or saving configuration.
    pub(crate) error: Option<String>,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new() -> Self {
        let mut aggregated_error: Option<String> = None;

        if let Err(err) = config::initialize() {
            Self::push_error(
                &mut aggregated_error,
                format!("Configuration load failed: {}", err),
            );
        }
        let settings = config::current();

        let mut app = Self {
            running: false,
            view: AppView::Workspace,
            focus: FocusTarget::QuestionCount,
            sidebar_collapsed: false,
            question_count: settings.question_count,
            ask_input: String::new(),
            answer: None,
            op_status: None,
            ask_in_flight: false,
            ask_receiver: None,
            browser_entries: Vec::new(),
            browser_index: 0,
            selected_file: None,
            file_status: None,
            file_preview: None,
            preview_receiver: None,
            quiz: None,
            form: QuizForm::default(),
            results: None,
            current_question: 0,
            quiz_status: None,
            quiz_generating: false,
            generating_count: 0,
            quiz_receiver: None,
            loading_frame: 0,
            api_client: ApiClient::new(config::server_url()),
            error: aggregated_error,
        };
        SidebarManager::apply_sidebar_state(&mut app, settings.sidebar_collapsed);
        app
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        let tick_rate = Duration::from_millis(120);
        while self.running {
            self.poll_background_messages();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(tick_rate)?;
        }
        Ok(())
    }

    /// Dispatch rendering based on the active view.
    fn render(&mut self, frame: &mut Frame) {
        UiRenderer::new(self).render(frame);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self, tick_rate: Duration) -> Result<()> {
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
                _ => {}
            }
            self.poll_background_messages();
        } else {
            self.on_tick();
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.ask_in_flight || self.quiz_generating {
            self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
            self.update_loading_status();
        }
        self.poll_background_messages();
    }

    fn poll_background_messages(&mut self) {
        self.poll_ask_messages();
        self.poll_quiz_messages();
        self.poll_preview_messages();
    }

    fn poll_ask_messages(&mut self) {
        let mut clear_receiver = false;
        if let Some(receiver) = self.ask_receiver.as_ref() {
            match receiver.try_recv() {
                Ok(message) => {
                    self.ask_in_flight = false;
                    clear_receiver = true;
                    match message {
                        AskTaskMessage::Success(answer) => {
                            SidebarManager::apply_ask_result(self, Ok(answer))
                        }
                        AskTaskMessage::Error(message) => {
                            SidebarManager::apply_ask_result(self, Err(message))
                        }
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.ask_in_flight = false;
                    clear_receiver = true;
                    SidebarManager::apply_ask_result(
                        self,
                        Err("Background ask worker disconnected".to_string()),
                    );
                }
            }
        }

        if clear_receiver {
            self.ask_receiver = None;
        }
    }

    fn poll_quiz_messages(&mut self) {
        let mut clear_receiver = false;
        if let Some(receiver) = self.quiz_receiver.as_ref() {
            match receiver.try_recv() {
                Ok(message) => {
                    self.quiz_generating = false;
                    clear_receiver = true;
                    match message {
                        QuizTaskMessage::Success(questions) => {
                            QuizManager::apply_generate_result(self, Ok(questions))
                        }
                        QuizTaskMessage::Error(message) => {
                            QuizManager::apply_generate_result(self, Err(message))
                        }
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.quiz_generating = false;
                    clear_receiver = true;
                    QuizManager::apply_generate_result(
                        self,
                        Err("Background quiz worker disconnected".to_string()),
                    );
                }
            }
        }

        if clear_receiver {
            self.quiz_receiver = None;
        }
    }

    fn poll_preview_messages(&mut self) {
        let mut clear_receiver = false;
        if let Some(receiver) = self.preview_receiver.as_ref() {
            match receiver.try_recv() {
                Ok(content) => {
                    clear_receiver = true;
                    FileManager::apply_preview(self, content);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    clear_receiver = true;
                    log_debug("App: preview worker disconnected");
                }
            }
        }

        if clear_receiver {
            self.preview_receiver = None;
        }
    }

    pub(crate) fn update_loading_status(&mut self) {
        let frame = LOADING_FRAMES[self.loading_frame % LOADING_FRAMES.len()];
        if self.ask_in_flight {
            self.op_status = Some(format!("{} Answering...", frame));
        }
        if self.quiz_generating {
            self.quiz_status = Some(format!(
                "{} Generating {} questions...",
                frame, self.generating_count
            ));
        }
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        if let (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) =
            (key.modifiers, key.code)
        {
            self.quit();
            return;
        }
        match self.view {
            AppView::Workspace => self.on_workspace_key(key),
            AppView::FileBrowser => FileManager::new(self).handle_key(key),
        }
    }

    fn on_workspace_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('b') | KeyCode::Char('B')) => {
                SidebarManager::new(self).toggle_sidebar()
            }
            (KeyModifiers::CONTROL, KeyCode::Char('o') | KeyCode::Char('O')) => {
                FileManager::show_browser(self)
            }
            (KeyModifiers::NONE, KeyCode::Tab) => self.focus_next(),
            (KeyModifiers::NONE, KeyCode::BackTab)
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => self.focus_previous(),
            _ => match self.focus {
                FocusTarget::QuestionCount => SidebarManager::new(self).handle_count_key(key),
                FocusTarget::AskInput => SidebarManager::new(self).handle_ask_key(key),
                FocusTarget::QuizList => QuizManager::new(self).handle_key(key),
            },
        }
    }

    /// Cycle focus forward through the workspace panes. With the sidebar
    /// hidden the quiz list is the only focusable pane.
    fn focus_next(&mut self) {
        self.focus = if self.sidebar_collapsed {
            FocusTarget::QuizList
        } else {
            match self.focus {
                FocusTarget::QuestionCount => FocusTarget::AskInput,
                FocusTarget::AskInput => FocusTarget::QuizList,
                FocusTarget::QuizList => FocusTarget::QuestionCount,
            }
        };
    }

    fn focus_previous(&mut self) {
        self.focus = if self.sidebar_collapsed {
            FocusTarget::QuizList
        } else {
            match self.focus {
                FocusTarget::QuestionCount => FocusTarget::QuizList,
                FocusTarget::AskInput => FocusTarget::QuestionCount,
                FocusTarget::QuizList => FocusTarget::AskInput,
            }
        };
    }

    /// Set running to false to quit the application.
    pub(crate) fn quit(&mut self) {
        self.running = false;
    }

    /// Append a message to an optional error slot.
    pub(crate) fn push_error(slot: &mut Option<String>, message: String) {
        if let Some(existing) = slot {
            existing.push_str(" | ");
            existing.push_str(&message);
        } else {
            *slot = Some(message);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A workspace-view [`App`] with empty state, for exercising managers
    /// without touching the terminal, network, or config file.
    pub(crate) fn blank_app() -> App {
        App {
            running: false,
            view: AppView::Workspace,
            focus: FocusTarget::QuestionCount,
            sidebar_collapsed: false,
            question_count: 5,
            ask_input: String::new(),
            answer: None,
            op_status: None,
            ask_in_flight: false,
            ask_receiver: None,
            browser_entries: Vec::new(),
            browser_index: 0,
            selected_file: None,
            file_status: None,
            file_preview: None,
            preview_receiver: None,
            quiz: None,
            form: QuizForm::default(),
            results: None,
            current_question: 0,
            quiz_status: None,
            quiz_generating: false,
            generating_count: 0,
            quiz_receiver: None,
            loading_frame: 0,
            api_client: ApiClient::new("http://127.0.0.1:5000"),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::blank_app;

    #[test]
    fn focus_cycles_through_every_pane_when_the_sidebar_is_visible() {
        let mut app = blank_app();
        app.focus_next();
        assert_eq!(app.focus, FocusTarget::AskInput);
        app.focus_next();
        assert_eq!(app.focus, FocusTarget::QuizList);
        app.focus_next();
        assert_eq!(app.focus, FocusTarget::QuestionCount);
        app.focus_previous();
        assert_eq!(app.focus, FocusTarget::QuizList);
    }

    #[test]
    fn focus_is_pinned_to_the_quiz_list_when_the_sidebar_is_hidden() {
        let mut app = blank_app();
        app.sidebar_collapsed = true;
        app.focus = FocusTarget::QuizList;
        app.focus_next();
        assert_eq!(app.focus, FocusTarget::QuizList);
        app.focus_previous();
        assert_eq!(app.focus, FocusTarget::QuizList);
    }

    #[test]
    fn push_error_joins_messages_in_order() {
        let mut slot = None;
        App::push_error(&mut slot, "first".to_string());
        App::push_error(&mut slot, "second".to_string());
        assert_eq!(slot.as_deref(), Some("first | second"));
    }

    #[test]
    fn loading_status_carries_the_captured_question_count() {
        let mut app = blank_app();
        app.quiz_generating = true;
        app.generating_count = 7;
        app.update_loading_status();
        let status = app.quiz_status.expect("status while generating");
        assert!(
            status.ends_with("Generating 7 questions..."),
            "unexpected status: {}",
            status
        );
    }
}
