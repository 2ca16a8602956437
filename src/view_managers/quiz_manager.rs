use crate::{
    App, api_client,
    export_manager::ExportManager,
    log_util::log_debug,
    quiz::{self, GradeOutcome, QuizForm, QuizQuestion, QuizState},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct QuizManager<'a> {
    app: &'a mut App,
}

impl<'a> QuizManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Esc | KeyCode::Char('q')) => self.app.quit(),
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.select_next(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.select_previous(),
            (KeyModifiers::NONE, KeyCode::Char(label @ 'a'..='d'))
            | (KeyModifiers::SHIFT, KeyCode::Char(label @ 'A'..='D')) => {
                self.select_choice(label.to_ascii_uppercase())
            }
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('s')) => self.grade_quiz(),
            (KeyModifiers::NONE, KeyCode::Char('g')) => api_client::trigger_generate(self.app),
            (KeyModifiers::NONE, KeyCode::Char('e')) => self.export_csv(),
            (KeyModifiers::NONE, KeyCode::Char('p')) => self.export_pdf(),
            _ => {}
        }
    }

    /// Fold a finished generate call into the workspace. A failure leaves the
    /// current quiz and form exactly as they were.
    pub(crate) fn apply_generate_result(app: &mut App, result: Result<Vec<QuizQuestion>, String>) {
        match result {
            Ok(questions) => {
                log_debug(&format!(
                    "App: quiz generated with {} question(s)",
                    questions.len()
                ));
                app.quiz = Some(QuizState::new(questions));
                Self::render_quiz(app);
                app.quiz_status = Some("✅ Quiz ready.".to_string());
            }
            Err(message) => {
                app.quiz_status = Some(format!("⚠️ {}", message));
                log_debug(&format!("App: quiz generation failed: {}", message));
            }
        }
    }

    /// Rebuild the answer form from the stored quiz, in one step. Selections,
    /// grading output, the highlight, and the status line all reset; the
    /// stored questions are the only input.
    pub(crate) fn render_quiz(app: &mut App) {
        app.form = match &app.quiz {
            Some(state) => QuizForm::from_questions(&state.questions),
            None => QuizForm::default(),
        };
        app.results = None;
        app.current_question = 0;
        app.quiz_status = None;
    }

    fn select_next(&mut self) {
        let total = self.app.form.entries.len();
        if total == 0 {
            self.app.current_question = 0;
            return;
        }
        self.app.current_question = (self.app.current_question + 1) % total;
    }

    fn select_previous(&mut self) {
        let total = self.app.form.entries.len();
        if total == 0 {
            self.app.current_question = 0;
            return;
        }
        self.app.current_question = if self.app.current_question == 0 {
            total - 1
        } else {
            self.app.current_question - 1
        };
    }

    fn select_choice(&mut self, label: char) {
        let index = self.app.current_question;
        if self.app.form.set_selection(index, label) {
            log_debug(&format!("App: question {} answered {}", index + 1, label));
        }
    }

    fn grade_quiz(&mut self) {
        if self.app.quiz.is_none() {
            log_debug("App: grade requested without a quiz");
            return;
        }
        match quiz::grade(&self.app.form) {
            GradeOutcome::Incomplete { missing } => {
                self.app.results = None;
                self.app.quiz_status = Some(quiz::missing_message(&missing));
            }
            GradeOutcome::Scored(report) => {
                log_debug(&format!("App: graded {}", report.summary()));
                self.app.results = Some(report);
                self.app.quiz_status = Some("✅ Graded.".to_string());
            }
        }
    }

    fn export_csv(&mut self) {
        let Some(state) = self.app.quiz.as_ref() else {
            log_debug("App: CSV export requested without a quiz");
            return;
        };
        match ExportManager::new().export_csv(&state.questions) {
            Ok(Some(path)) => {
                self.app.quiz_status = Some(format!("Exported {}", path.display()));
                log_debug(&format!("App: exported CSV to {}", path.display()));
            }
            Ok(None) => log_debug("App: skipped CSV export for empty quiz"),
            Err(err) => {
                self.app.quiz_status = Some(format!("⚠️ {}", err));
                log_debug(&format!("App: CSV export failed: {}", err));
            }
        }
    }

    fn export_pdf(&mut self) {
        let Some(state) = self.app.quiz.as_ref() else {
            log_debug("App: PDF export requested without a quiz");
            return;
        };
        match ExportManager::new().export_pdf(&state.questions) {
            Ok(Some(path)) => {
                self.app.quiz_status = Some(format!("Exported {}", path.display()));
                log_debug(&format!("App: exported PDF to {}", path.display()));
            }
            Ok(None) => log_debug("App: skipped PDF export for empty quiz"),
            Err(err) => {
                self.app.quiz_status = Some(format!("⚠️ {}", err));
                log_debug(&format!("App: PDF export failed: {}", err));
            }
        }
    }
}
