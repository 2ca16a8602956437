use crate::quiz::{CHOICE_LABELS, FormEntry, GradeRow};
use crate::{App, AppView, FocusTarget, config, file_preview, view_managers::SidebarManager};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

pub(crate) struct UiRenderer<'a> {
    app: &'a mut App,
}

impl<'a> UiRenderer<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn render(&mut self, frame: &mut Frame) {
        match self.app.view {
            AppView::Workspace => self.render_workspace(frame),
            AppView::FileBrowser => self.render_file_browser(frame),
        }
    }

    fn render_workspace(&mut self, frame: &mut Frame) {
        let app = &mut *self.app;
        let header_title = Line::from("Quizdeck").bold().blue().centered();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(10),
                Constraint::Length(8),
            ])
            .split(frame.area());

        frame.render_widget(
            Paragraph::new(Self::header_text(app))
                .block(Block::bordered().title(header_title))
                .centered(),
            layout[0],
        );

        let (sidebar_area, quiz_area) = if app.sidebar_collapsed {
            (None, layout[1])
        } else {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
                .split(layout[1]);
            (Some(body[0]), body[1])
        };

        if let Some(sidebar_area) = sidebar_area {
            let panes = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Min(4),
                    Constraint::Min(4),
                ])
                .split(sidebar_area);

            frame.render_widget(
                Gauge::default()
                    .block(Block::bordered().title(Self::pane_title(
                        app,
                        FocusTarget::QuestionCount,
                        "Questions",
                    )))
                    .gauge_style(Style::default().blue())
                    .percent(SidebarManager::count_percent(
                        app.question_count,
                        config::QUESTION_COUNT_MIN,
                        config::QUESTION_COUNT_MAX,
                    ))
                    .label(format!("{} questions", app.question_count)),
                panes[0],
            );

            let ask_text = if app.focus == FocusTarget::AskInput {
                format!("{}▌", app.ask_input)
            } else {
                app.ask_input.clone()
            };
            frame.render_widget(
                Paragraph::new(ask_text).block(Block::bordered().title(Self::pane_title(
                    app,
                    FocusTarget::AskInput,
                    "Ask Your Notes",
                ))),
                panes[1],
            );

            let answer_text = match &app.answer {
                Some(answer) => answer.clone(),
                None => "Ask a question to see the answer here.".to_string(),
            };
            frame.render_widget(
                Paragraph::new(answer_text)
                    .wrap(Wrap { trim: false })
                    .block(Block::bordered().title(Line::from("Answer"))),
                panes[2],
            );

            let preview_text = match &app.file_preview {
                Some(content) => content.clone(),
                None => "Press Ctrl-O to browse note files.".to_string(),
            };
            frame.render_widget(
                Paragraph::new(preview_text)
                    .wrap(Wrap { trim: false })
                    .block(Block::bordered().title(Line::from("Note Preview"))),
                panes[3],
            );
        }

        let (list_area, results_area) = match &app.results {
            Some(report) => {
                let height = (report.rows.len() as u16).saturating_add(3).min(12);
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(6), Constraint::Length(height)])
                    .split(quiz_area);
                (rows[0], Some(rows[1]))
            }
            None => (quiz_area, None),
        };

        let quiz_items: Vec<ListItem> = if app.form.is_empty() {
            vec![ListItem::new(
                "No quiz yet. Press g in this pane to generate questions from your notes.",
            )]
        } else {
            app.form
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| Self::question_item(index, entry))
                .collect()
        };

        let mut quiz_state = ListState::default();
        if !app.form.is_empty() {
            quiz_state.select(Some(app.current_question.min(app.form.entries.len() - 1)));
        }

        frame.render_stateful_widget(
            List::new(quiz_items)
                .block(Block::bordered().title(Self::pane_title(
                    app,
                    FocusTarget::QuizList,
                    "Quiz",
                )))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            list_area,
            &mut quiz_state,
        );

        if let (Some(results_area), Some(report)) = (results_area, &app.results) {
            let mut result_lines: Vec<String> =
                report.rows.iter().map(Self::result_line).collect();
            result_lines.push(report.summary());

            frame.render_widget(
                Paragraph::new(result_lines.join("\n"))
                    .wrap(Wrap { trim: false })
                    .block(Block::bordered().title(Line::from("Results"))),
                results_area,
            );
        }

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        if let Some(status) = &app.op_status {
            status_lines.push(format!("Ask: {}", status));
        }
        if let Some(status) = &app.file_status {
            status_lines.push(format!("File: {}", status));
        }
        if let Some(status) = &app.quiz_status {
            status_lines.push(format!("Quiz: {}", status));
        }
        status_lines.push(
            match app.focus {
                FocusTarget::QuestionCount => {
                    "Use ←/→ or h/l to adjust the count. Press Enter or g to generate. Esc, Ctrl-C, or q to quit."
                }
                FocusTarget::AskInput => {
                    "Type a question and press Enter to ask. Esc returns to the quiz list."
                }
                FocusTarget::QuizList => {
                    "Use ↑/↓ or j/k to move. Press a-d to answer, Enter or s to grade. Esc, Ctrl-C, or q to quit."
                }
            }
            .to_string(),
        );
        status_lines.push(
            "Tab cycles focus. Ctrl-B toggles the sidebar. Ctrl-O opens the note browser."
                .to_string(),
        );
        if app.quiz.is_some() {
            status_lines
                .push("Press g to regenerate, e to export CSV, p to export PDF.".to_string());
        }

        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn render_file_browser(&mut self, frame: &mut Frame) {
        let app = &mut *self.app;
        let header_title = Line::from("Quizdeck").bold().blue().centered();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(6),
                Constraint::Length(6),
            ])
            .split(frame.area());

        frame.render_widget(
            Paragraph::new(Self::header_text(app))
                .block(Block::bordered().title(header_title))
                .centered(),
            layout[0],
        );

        let list_items: Vec<ListItem> = if app.browser_entries.is_empty() {
            vec![ListItem::new("No files found in the notes directory.")]
        } else {
            app.browser_entries
                .iter()
                .map(|path| {
                    let marker = if app.selected_file.as_deref() == Some(path.as_path()) {
                        "● "
                    } else {
                        "  "
                    };
                    ListItem::new(format!("{}{}", marker, file_preview::file_label(path)))
                })
                .collect()
        };

        let mut list_state = ListState::default();
        if !app.browser_entries.is_empty() {
            list_state.select(Some(app.browser_index.min(app.browser_entries.len() - 1)));
        }

        frame.render_stateful_widget(
            List::new(list_items)
                .block(Block::bordered().title(Line::from(format!(
                    "Note Files • {}",
                    config::notes_dir().display()
                ))))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            layout[1],
            &mut list_state,
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        if let Some(status) = &app.file_status {
            status_lines.push(format!("File: {}", status));
        }
        status_lines.push(format!("Files listed: {}", app.browser_entries.len()));
        status_lines.push(
            "Use ↑/↓ or j/k to navigate. Enter selects a file, x clears the selection."
                .to_string(),
        );
        status_lines.push("Esc or m returns to the workspace. q quits.".to_string());

        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn question_item(index: usize, entry: &FormEntry) -> ListItem<'static> {
        let mut lines = vec![Line::from(format!("{}. {}", index + 1, entry.prompt)).bold()];
        for (slot, choice) in entry.choices.iter().enumerate() {
            let label = CHOICE_LABELS[slot];
            let marker = if entry.selected == Some(label) {
                "●"
            } else {
                "○"
            };
            lines.push(Line::from(format!("   {} {}) {}", marker, label, choice)));
        }
        lines.push(Line::from(""));
        ListItem::new(lines)
    }

    /// One results row, the same shape whether the answer was right or wrong.
    fn result_line(row: &GradeRow) -> String {
        let marker = if row.is_correct { "✓" } else { "✗" };
        format!(
            "Question {}: {} {} (correct: {})",
            row.position, marker, row.selected, row.correct
        )
    }

    fn pane_title(app: &App, target: FocusTarget, label: &str) -> Line<'static> {
        if app.focus == target {
            Line::from(format!("▶ {}", label)).bold()
        } else {
            Line::from(label.to_string())
        }
    }

    fn header_text(app: &App) -> String {
        let note_line = match &app.selected_file {
            Some(path) => format!("Note: {}", file_preview::file_label(path)),
            None => "Note: <none>".to_string(),
        };
        let quiz_line = match &app.quiz {
            Some(quiz) => format!(
                "Quiz: {} questions (generated {})",
                quiz.questions.len(),
                quiz.generated_at.format("%H:%M:%S")
            ),
            None => "Quiz: <none>".to_string(),
        };
        format!(
            "Server: {}\n{}\n{}",
            app.api_client.base_url(),
            note_line,
            quiz_line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_rows_always_show_the_correct_answer() {
        let right = GradeRow {
            position: 1,
            selected: 'A',
            correct: "A".to_string(),
            is_correct: true,
        };
        let wrong = GradeRow {
            position: 2,
            selected: 'B',
            correct: "C".to_string(),
            is_correct: false,
        };
        assert_eq!(
            UiRenderer::result_line(&right),
            "Question 1: ✓ A (correct: A)"
        );
        assert_eq!(
            UiRenderer::result_line(&wrong),
            "Question 2: ✗ B (correct: C)"
        );
    }
}
