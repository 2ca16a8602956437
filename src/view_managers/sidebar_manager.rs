use crate::{App, FocusTarget, api_client, config, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct SidebarManager<'a> {
    app: &'a mut App,
}

impl<'a> SidebarManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    /// Apply a collapse state to the workspace. Hiding the sidebar moves
    /// focus to the quiz list, the only pane left on screen.
    pub(crate) fn apply_sidebar_state(app: &mut App, collapsed: bool) {
        app.sidebar_collapsed = collapsed;
        if collapsed
            && matches!(
                app.focus,
                FocusTarget::QuestionCount | FocusTarget::AskInput
            )
        {
            app.focus = FocusTarget::QuizList;
        }
    }

    /// Flip the sidebar and persist the new state for the next session.
    pub(crate) fn toggle_sidebar(&mut self) {
        let collapsed = !self.app.sidebar_collapsed;
        Self::apply_sidebar_state(self.app, collapsed);
        match config::update(|config| config.sidebar_collapsed = collapsed) {
            Ok(_) => log_debug(&format!("App: sidebar collapsed = {}", collapsed)),
            Err(err) => {
                App::push_error(
                    &mut self.app.error,
                    format!("Failed to save sidebar state: {}", err),
                );
                log_debug(&format!("App: failed to save sidebar state: {}", err));
            }
        }
    }

    pub(crate) fn handle_count_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Esc | KeyCode::Char('q')) => self.app.quit(),
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-')) => {
                self.adjust_count(-1)
            }
            (
                KeyModifiers::NONE,
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Char('='),
            ) => self.adjust_count(1),
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('g')) => {
                api_client::trigger_generate(self.app)
            }
            _ => {}
        }
    }

    fn adjust_count(&mut self, delta: i32) {
        let updated = (i32::from(self.app.question_count) + delta).clamp(
            i32::from(config::QUESTION_COUNT_MIN),
            i32::from(config::QUESTION_COUNT_MAX),
        );
        self.app.question_count = updated as u16;
    }

    pub(crate) fn handle_ask_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Esc) => self.app.focus = FocusTarget::QuizList,
            (KeyModifiers::NONE, KeyCode::Enter) => api_client::trigger_ask(self.app),
            (KeyModifiers::NONE, KeyCode::Backspace) => {
                self.app.ask_input.pop();
            }
            (KeyModifiers::NONE, KeyCode::Char(ch))
            | (KeyModifiers::SHIFT, KeyCode::Char(ch)) => self.app.ask_input.push(ch),
            _ => {}
        }
    }

    /// Fold the finished ask call into the workspace. The question stays in
    /// the input box either way; a failure keeps the previous answer visible.
    pub(crate) fn apply_ask_result(app: &mut App, result: Result<String, String>) {
        match result {
            Ok(answer) => {
                app.answer = Some(answer);
                app.op_status = Some("✅ Answer ready.".to_string());
                log_debug("App: answer applied");
            }
            Err(message) => {
                app.op_status = Some(format!("⚠️ {}", message));
                log_debug(&format!("App: ask failed: {}", message));
            }
        }
    }

    /// Fill ratio of the question-count gauge, in percent. A degenerate
    /// range renders as empty instead of dividing by zero.
    pub(crate) fn count_percent(value: u16, min: u16, max: u16) -> u16 {
        if max <= min {
            return 0;
        }
        let span = f64::from(max) - f64::from(min);
        let offset = f64::from(value.clamp(min, max)) - f64::from(min);
        ((offset / span) * 100.0).round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::blank_app;

    #[test]
    fn hiding_the_sidebar_moves_focus_to_the_quiz_list() {
        let mut app = blank_app();
        app.focus = FocusTarget::AskInput;
        SidebarManager::apply_sidebar_state(&mut app, true);
        assert!(app.sidebar_collapsed);
        assert_eq!(app.focus, FocusTarget::QuizList);
    }

    #[test]
    fn showing_the_sidebar_keeps_the_current_focus() {
        let mut app = blank_app();
        app.sidebar_collapsed = true;
        app.focus = FocusTarget::QuizList;
        SidebarManager::apply_sidebar_state(&mut app, false);
        assert!(!app.sidebar_collapsed);
        assert_eq!(app.focus, FocusTarget::QuizList);
    }

    #[test]
    fn question_count_stays_inside_its_bounds() {
        let mut app = blank_app();
        app.question_count = config::QUESTION_COUNT_MAX;
        {
            let mut manager = SidebarManager::new(&mut app);
            manager.adjust_count(1);
        }
        assert_eq!(app.question_count, config::QUESTION_COUNT_MAX);

        app.question_count = config::QUESTION_COUNT_MIN;
        {
            let mut manager = SidebarManager::new(&mut app);
            manager.adjust_count(-1);
        }
        assert_eq!(app.question_count, config::QUESTION_COUNT_MIN);

        {
            let mut manager = SidebarManager::new(&mut app);
            manager.adjust_count(2);
        }
        assert_eq!(app.question_count, config::QUESTION_COUNT_MIN + 2);
    }

    #[test]
    fn ask_box_collects_typed_characters() {
        let mut app = blank_app();
        app.focus = FocusTarget::AskInput;
        {
            let mut manager = SidebarManager::new(&mut app);
            manager.handle_ask_key(KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT));
            manager.handle_ask_key(KeyEvent::new(KeyCode::Char('i'), KeyModifiers::NONE));
            manager.handle_ask_key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE));
            manager.handle_ask_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        }
        assert_eq!(app.ask_input, "Hi");
    }

    #[test]
    fn escape_returns_focus_to_the_quiz_list() {
        let mut app = blank_app();
        app.focus = FocusTarget::AskInput;
        {
            let mut manager = SidebarManager::new(&mut app);
            manager.handle_ask_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        }
        assert_eq!(app.focus, FocusTarget::QuizList);
    }

    #[test]
    fn successful_answer_keeps_the_question_in_the_input() {
        let mut app = blank_app();
        app.ask_input = "What is ownership?".to_string();
        SidebarManager::apply_ask_result(&mut app, Ok("A set of rules.".to_string()));
        assert_eq!(app.answer.as_deref(), Some("A set of rules."));
        assert_eq!(app.op_status.as_deref(), Some("✅ Answer ready."));
        assert_eq!(
            app.ask_input, "What is ownership?",
            "the input is kept so the question stays visible"
        );
    }

    #[test]
    fn failed_answer_keeps_the_previous_answer_visible() {
        let mut app = blank_app();
        app.answer = Some("Previous answer.".to_string());
        SidebarManager::apply_ask_result(&mut app, Err("Please upload notes first.".to_string()));
        assert_eq!(
            app.op_status.as_deref(),
            Some("⚠️ Please upload notes first.")
        );
        assert_eq!(app.answer.as_deref(), Some("Previous answer."));
    }

    #[test]
    fn gauge_percent_spans_the_count_range() {
        assert_eq!(SidebarManager::count_percent(1, 1, 10), 0);
        assert_eq!(SidebarManager::count_percent(10, 1, 10), 100);
        assert_eq!(SidebarManager::count_percent(5, 1, 10), 44);
        assert_eq!(
            SidebarManager::count_percent(3, 5, 5),
            0,
            "degenerate range renders empty"
        );
    }
}
