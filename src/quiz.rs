use chrono::{DateTime, Local};
use serde::Deserialize;

pub(crate) const CHOICE_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// One multiple-choice question as returned by the quiz server.
///
/// Treated as untrusted input: every field defaults when missing, and the
/// correct label is normalized before it is used for anything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub correct: String,
}

/// Authoritative quiz content from the most recent successful generate call.
/// Replaced wholesale on every generate; never touched by grading.
#[derive(Debug, Clone)]
pub struct QuizState {
    pub questions: Vec<QuizQuestion>,
    pub generated_at: DateTime<Local>,
}

impl QuizState {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            generated_at: Local::now(),
        }
    }
}

/// One rendered question: display texts, the answer key, and the user's pick.
#[derive(Debug, Clone)]
pub struct FormEntry {
    pub prompt: String,
    pub choices: [String; 4],
    /// Normalized correct label captured at render time. Grading reads only
    /// this value, so a later generate cannot corrupt an in-progress pass.
    pub answer_key: String,
    pub selected: Option<char>,
}

/// The rendered quiz form. Rebuilt in one step on every render.
#[derive(Debug, Clone, Default)]
pub struct QuizForm {
    pub entries: Vec<FormEntry>,
}

impl QuizForm {
    pub fn from_questions(questions: &[QuizQuestion]) -> Self {
        let entries = questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let prompt = if question.question.is_empty() {
                    format!("Question {}", index + 1)
                } else {
                    question.question.clone()
                };
                let choices = std::array::from_fn(|slot| {
                    let raw = question
                        .choices
                        .get(slot)
                        .map(String::as_str)
                        .unwrap_or("")
                        .trim();
                    display_choice(raw)
                });
                FormEntry {
                    prompt,
                    choices,
                    answer_key: normalize_correct_label(&question.correct),
                    selected: None,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a selection for the entry at `index`. Returns false when the
    /// index is out of range.
    pub fn set_selection(&mut self, index: usize, label: char) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.selected = Some(label);
                true
            }
            None => false,
        }
    }
}

/// Keep only the letters A-D from a raw correct label and upper-case them.
/// Guards against backend inconsistencies such as "b)", " B ", or "(A)".
pub fn normalize_correct_label(raw: &str) -> String {
    raw.chars()
        .filter(|ch| matches!(ch.to_ascii_uppercase(), 'A'..='D'))
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}

/// Strip a redundant leading "A) "-style prefix for display. The stored
/// choice text is never altered; an all-prefix value falls back to the raw
/// text so the choice never renders blank.
fn display_choice(raw: &str) -> String {
    let stripped = strip_choice_prefix(raw);
    if stripped.is_empty() {
        raw.to_string()
    } else {
        stripped.to_string()
    }
}

fn strip_choice_prefix(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(')')) if matches!(letter.to_ascii_uppercase(), 'A'..='D') => {
            chars.as_str().trim_start()
        }
        _ => raw,
    }
}

/// Result of a grading pass over the rendered form.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeOutcome {
    /// At least one question has no selection; positions are 1-indexed.
    Incomplete { missing: Vec<usize> },
    Scored(ScoreReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub rows: Vec<GradeRow>,
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
}

impl ScoreReport {
    pub fn summary(&self) -> String {
        format!("Score: {}/{} ({}%)", self.correct, self.total, self.percent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub position: usize,
    pub selected: char,
    pub correct: String,
    pub is_correct: bool,
}

/// Grade the form read-only. Completeness is a strict precondition: with any
/// entry unanswered no correctness information is produced at all. Re-running
/// after changed selections recomputes from scratch.
pub fn grade(form: &QuizForm) -> GradeOutcome {
    let missing: Vec<usize> = form
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.selected.is_none())
        .map(|(index, _)| index + 1)
        .collect();
    if !missing.is_empty() {
        return GradeOutcome::Incomplete { missing };
    }

    let mut rows = Vec::with_capacity(form.entries.len());
    let mut correct_count = 0;
    for (index, entry) in form.entries.iter().enumerate() {
        let Some(selected) = entry.selected else {
            continue;
        };
        let is_correct = selected.to_string() == entry.answer_key;
        if is_correct {
            correct_count += 1;
        }
        rows.push(GradeRow {
            position: index + 1,
            selected,
            correct: entry.answer_key.clone(),
            is_correct,
        });
    }

    let total = form.entries.len();
    GradeOutcome::Scored(ScoreReport {
        rows,
        correct: correct_count,
        total,
        percent: score_percent(correct_count, total),
    })
}

pub fn missing_message(missing: &[usize]) -> String {
    let list = missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Please answer all questions before submitting. Missing: {}.",
        list
    )
}

fn score_percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}
