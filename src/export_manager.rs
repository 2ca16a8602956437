use crate::quiz::QuizQuestion;
use color_eyre::eyre::{Context, Result, eyre};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use std::{
    env,
    fs::{self, File},
    io::BufWriter,
    path::PathBuf,
};

pub const CSV_FILENAME: &str = "quiz.csv";
pub const PDF_FILENAME: &str = "quiz.pdf";

const CSV_HEADER: &str = "question,choiceA,choiceB,choiceC,choiceD,correct";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_START_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 6.0;
/// Offsets past this start a fresh page.
const PAGE_BREAK_MM: f32 = 270.0;
const FONT_SIZE_PT: f32 = 12.0;
const QUESTION_INDENT_MM: f32 = 10.0;
const CHOICE_INDENT_MM: f32 = 14.0;
const QUESTION_GAP_MM: f32 = 2.0;
const CHOICE_GAP_MM: f32 = 1.0;
const ANSWER_GAP_MM: f32 = 4.0;
const QUESTION_WRAP_COLUMNS: usize = 90;
const CHOICE_WRAP_COLUMNS: usize = 87;

/// Writes quiz snapshots under the export root. Exports always target the
/// same fixed filenames, so a re-export overwrites the previous snapshot.
#[derive(Debug)]
pub struct ExportManager {
    root: PathBuf,
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::with_root("exports")
    }
}

impl ExportManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Write the quiz as a CSV spreadsheet. Returns the written path, or
    /// `None` when there is nothing to export.
    pub fn export_csv(&self, questions: &[QuizQuestion]) -> Result<Option<PathBuf>> {
        if questions.is_empty() {
            return Ok(None);
        }
        let path = self.prepare_target(CSV_FILENAME)?;
        fs::write(&path, csv_document(questions))
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        Ok(Some(path))
    }

    /// Render the quiz as a printable PDF. Returns the written path, or
    /// `None` when there is nothing to export.
    pub fn export_pdf(&self, questions: &[QuizQuestion]) -> Result<Option<PathBuf>> {
        if questions.is_empty() {
            return Ok(None);
        }
        let path = self.prepare_target(PDF_FILENAME)?;
        let document = render_pdf(questions)?;
        let file = File::create(&path)
            .wrap_err_with(|| format!("failed to create {}", path.display()))?;
        document
            .save(&mut BufWriter::new(file))
            .map_err(|err| eyre!("failed to save {}: {}", path.display(), err))?;
        Ok(Some(path))
    }

    fn prepare_target(&self, filename: &str) -> Result<PathBuf> {
        let mut dir = self.export_directory().map_err(|err| eyre!(err))?;
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("failed to create export directory {}", dir.display()))?;
        dir.push(filename);
        Ok(dir)
    }

    pub fn export_directory(&self) -> Result<PathBuf, String> {
        if self.root.is_absolute() {
            return Ok(self.root.clone());
        }

        match env::current_dir() {
            Ok(mut dir) => {
                dir.push(&self.root);
                Ok(dir)
            }
            Err(err) => Err(format!("failed to resolve current directory: {}", err)),
        }
    }
}

fn csv_document(questions: &[QuizQuestion]) -> String {
    let mut lines = Vec::with_capacity(questions.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for question in questions {
        let mut fields = Vec::with_capacity(6);
        fields.push(csv_field(&question.question));
        for slot in 0..4 {
            fields.push(csv_field(
                question.choices.get(slot).map(String::as_str).unwrap_or(""),
            ));
        }
        fields.push(csv_field(&question.correct));
        lines.push(fields.join(","));
    }
    lines.join("\r\n")
}

/// Quote a field when it contains a delimiter, quote, or line break; embedded
/// quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

struct PdfCursor {
    document: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    /// Offset from the top of the current page, in millimeters.
    y: f32,
}

impl PdfCursor {
    fn write_line(&mut self, text: &str, indent: f32) {
        if self.y > PAGE_BREAK_MM {
            self.break_page();
        }
        self.layer.use_text(
            text,
            FONT_SIZE_PT,
            Mm(indent),
            Mm(PAGE_HEIGHT_MM - self.y),
            &self.font,
        );
        self.y += LINE_HEIGHT_MM;
    }

    fn advance(&mut self, amount: f32) {
        self.y += amount;
    }

    fn break_page(&mut self) {
        let (page, layer) =
            self.document
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.document.get_page(page).get_layer(layer);
        self.y = TOP_START_MM;
    }
}

fn render_pdf(questions: &[QuizQuestion]) -> Result<PdfDocumentReference> {
    let (document, page, layer) =
        PdfDocument::new("Quiz", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| eyre!("failed to load built-in PDF font: {}", err))?;
    let layer = document.get_page(page).get_layer(layer);
    let mut cursor = PdfCursor {
        document,
        layer,
        font,
        y: TOP_START_MM,
    };

    for (index, question) in questions.iter().enumerate() {
        let heading = format!("{}. {}", index + 1, question.question);
        for line in wrap_text(&heading, QUESTION_WRAP_COLUMNS) {
            cursor.write_line(&line, QUESTION_INDENT_MM);
        }
        cursor.advance(QUESTION_GAP_MM);

        for choice in &question.choices {
            for line in wrap_text(&format!("- {}", choice), CHOICE_WRAP_COLUMNS) {
                cursor.write_line(&line, CHOICE_INDENT_MM);
            }
            cursor.advance(CHOICE_GAP_MM);
        }

        cursor.write_line(&format!("Answer: {}", question.correct), QUESTION_INDENT_MM);
        cursor.advance(ANSWER_GAP_MM);
    }

    Ok(cursor.document)
}

/// Greedy word wrap; words longer than a full line are broken hard. Always
/// yields at least one line so empty text still advances the cursor.
fn wrap_text(text: &str, max_columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_columns {
            let split_at = word
                .char_indices()
                .nth(max_columns)
                .map(|(offset, _)| offset)
                .unwrap_or(word.len());
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word[..split_at].to_string());
            word = &word[split_at..];
        }
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > max_columns && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
