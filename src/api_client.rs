use crate::{App, AskTaskMessage, FocusTarget, QuizTaskMessage, log_util, quiz::QuizQuestion};
use color_eyre::eyre::{Context, Result, eyre};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::{sync::mpsc, thread};
use tokio::runtime::Runtime;

/// Thin JSON client for the quiz server's `/ask` and `/generate_quiz`
/// endpoints. Both calls share one failure envelope: any response with a
/// non-success status or an `"ok": false` body counts as a failure, and the
/// server's `error` string becomes the user-facing message.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new [`ApiClient`] for the given server base URL. Trailing
    /// slashes are removed so routes can be appended directly.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask a free-form question about the uploaded notes.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let payload = json!({ "question": question });
        let body = self.post_json("/ask", &payload).await?;
        Ok(extract_answer(&body))
    }

    /// Request a freshly generated quiz with `count` questions.
    pub async fn generate_quiz(&self, count: u16) -> Result<Vec<QuizQuestion>> {
        let payload = json!({ "num_questions": count });
        let body = self.post_json("/generate_quiz", &payload).await?;
        extract_questions(&body)
    }

    async fn post_json(&self, route: &str, payload: &Value) -> Result<Value> {
        let endpoint = format!("{}{}", self.base_url, route);
        log_util::log_debug(&format!("ApiClient: invoking {}", endpoint));
        let response = self
            .client
            .post(&endpoint)
            .json(payload)
            .send()
            .await
            .wrap_err_with(|| format!("failed to reach quiz server at {}", endpoint))?;

        let status = response.status();
        log_util::log_debug(&format!("ApiClient: {} returned {}", route, status));
        // A failure body still carries the server's error message, so parse
        // before checking the status; an unparsable body becomes null.
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if is_failure(status, &body) {
            let message = failure_message(status, &body);
            log_util::log_debug(&format!("ApiClient: {} failed: {}", route, message));
            return Err(eyre!(message));
        }

        Ok(body)
    }
}

/// Kick off a background `/ask` request for the question currently in the
/// input box. The input itself is left untouched so the question stays
/// visible next to its answer.
pub(crate) fn trigger_ask(app: &mut App) {
    let question = app.ask_input.trim().to_string();
    if question.is_empty() {
        app.focus = FocusTarget::AskInput;
        log_util::log_debug("ApiClient: ignoring ask with empty question");
        return;
    }
    if app.ask_in_flight {
        log_util::log_debug("ApiClient: ask already in progress; ignoring duplicate request");
        return;
    }

    let client = app.api_client.clone();
    let (sender, receiver) = mpsc::channel();
    app.ask_receiver = Some(receiver);
    app.ask_in_flight = true;
    app.loading_frame = 0;
    app.update_loading_status();
    log_util::log_debug("ApiClient: starting ask task");

    thread::spawn(move || {
        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = sender.send(AskTaskMessage::Error(format!(
                    "Failed to build Tokio runtime: {}",
                    err
                )));
                return;
            }
        };

        let result = runtime.block_on(client.ask(&question));
        drop(runtime);

        match result {
            Ok(answer) => {
                let _ = sender.send(AskTaskMessage::Success(answer));
            }
            Err(err) => {
                let _ = sender.send(AskTaskMessage::Error(err.to_string()));
            }
        }
    });
}

/// Kick off a background `/generate_quiz` request for the currently selected
/// question count.
pub(crate) fn trigger_generate(app: &mut App) {
    if app.quiz_generating {
        log_util::log_debug(
            "ApiClient: quiz generation already in progress; ignoring duplicate request",
        );
        return;
    }

    let count = app.question_count;
    let client = app.api_client.clone();
    let (sender, receiver) = mpsc::channel();
    app.quiz_receiver = Some(receiver);
    app.quiz_generating = true;
    app.generating_count = count;
    app.loading_frame = 0;
    app.update_loading_status();
    log_util::log_debug(&format!(
        "ApiClient: starting quiz generation task for {} questions",
        count
    ));

    thread::spawn(move || {
        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = sender.send(QuizTaskMessage::Error(format!(
                    "Failed to build Tokio runtime: {}",
                    err
                )));
                return;
            }
        };

        let result = runtime.block_on(client.generate_quiz(count));
        drop(runtime);

        match result {
            Ok(questions) => {
                let _ = sender.send(QuizTaskMessage::Success(questions));
            }
            Err(err) => {
                let _ = sender.send(QuizTaskMessage::Error(err.to_string()));
            }
        }
    });
}

fn is_failure(status: StatusCode, body: &Value) -> bool {
    !status.is_success() || body.get("ok").and_then(Value::as_bool) == Some(false)
}

/// Error text for a failed call: the server's message when it sent one,
/// otherwise a generic line carrying the HTTP status code.
fn failure_message(status: StatusCode, body: &Value) -> String {
    match body.get("error").and_then(Value::as_str) {
        Some(error) if !error.trim().is_empty() => error.to_string(),
        _ => format!("Request failed: {}", status.as_u16()),
    }
}

fn extract_answer(body: &Value) -> String {
    match body.get("answer").and_then(Value::as_str) {
        Some(answer) if !answer.is_empty() => answer.to_string(),
        _ => "(no answer)".to_string(),
    }
}

fn extract_questions(body: &Value) -> Result<Vec<QuizQuestion>> {
    match body.get("quiz") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(raw) => serde_json::from_value(raw.clone())
            .wrap_err("failed to deserialize quiz questions from server response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::blank_app;
    use std::{fs, path::Path};

    fn fixture(name: &str) -> Value {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_fixtures")
            .join(name);
        let raw = fs::read_to_string(&path).expect("read fixture");
        serde_json::from_str(&raw).expect("parse fixture")
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_the_base_url() {
        let client = ApiClient::new("http://127.0.0.1:5000///");
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn success_requires_status_and_envelope() {
        assert!(!is_failure(StatusCode::OK, &json!({ "ok": true })));
        assert!(
            !is_failure(StatusCode::OK, &json!({ "answer": "text" })),
            "a body without an ok flag is not a failure"
        );
        assert!(is_failure(StatusCode::OK, &json!({ "ok": false })));
        assert!(is_failure(StatusCode::BAD_REQUEST, &json!({ "ok": true })));
        assert!(is_failure(StatusCode::INTERNAL_SERVER_ERROR, &Value::Null));
    }

    #[test]
    fn failure_message_prefers_the_server_error() {
        let body = json!({ "ok": false, "error": "Please upload notes first." });
        assert_eq!(
            failure_message(StatusCode::BAD_REQUEST, &body),
            "Please upload notes first."
        );
    }

    #[test]
    fn failure_message_falls_back_to_the_status_code() {
        assert_eq!(
            failure_message(StatusCode::BAD_REQUEST, &json!({ "ok": false, "error": "" })),
            "Request failed: 400"
        );
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, &Value::Null),
            "Request failed: 502"
        );
    }

    #[test]
    fn missing_or_empty_answers_become_a_placeholder() {
        assert_eq!(extract_answer(&json!({ "ok": true })), "(no answer)");
        assert_eq!(
            extract_answer(&json!({ "ok": true, "answer": "" })),
            "(no answer)"
        );
        assert_eq!(
            extract_answer(&json!({ "ok": true, "answer": "Two." })),
            "Two."
        );
    }

    #[test]
    fn quiz_fixture_parses_into_questions() {
        let body = fixture("generate_quiz_response.json");
        let questions = extract_questions(&body).expect("parse quiz");
        assert_eq!(questions.len(), 5);
        assert_eq!(
            questions[0].question,
            "Which keyword introduces a new variable binding?"
        );
        assert_eq!(questions[0].choices.len(), 4);
        assert_eq!(questions[0].correct, "A");
    }

    #[test]
    fn absent_or_null_quiz_is_an_empty_list() {
        assert!(
            extract_questions(&json!({ "ok": true }))
                .expect("parse missing quiz")
                .is_empty()
        );
        assert!(
            extract_questions(&json!({ "ok": true, "quiz": null }))
                .expect("parse null quiz")
                .is_empty()
        );
    }

    #[test]
    fn malformed_quiz_payload_is_an_error() {
        assert!(extract_questions(&json!({ "ok": true, "quiz": "nope" })).is_err());
    }

    #[test]
    fn partial_question_objects_fill_in_defaults() {
        let body = json!({ "ok": true, "quiz": [ { "question": "Only a question" } ] });
        let questions = extract_questions(&body).expect("parse partial quiz");
        assert_eq!(questions[0].question, "Only a question");
        assert!(questions[0].choices.is_empty());
        assert_eq!(questions[0].correct, "");
    }

    #[test]
    fn asking_with_an_empty_question_refocuses_the_input() {
        let mut app = blank_app();
        app.ask_input = "   ".to_string();
        app.focus = FocusTarget::QuizList;
        trigger_ask(&mut app);
        assert_eq!(app.focus, FocusTarget::AskInput);
        assert!(app.ask_receiver.is_none());
        assert!(!app.ask_in_flight);
        assert!(app.op_status.is_none());
    }

    #[test]
    fn an_ask_in_flight_ignores_a_duplicate_trigger() {
        let mut app = blank_app();
        app.ask_input = "What is ownership?".to_string();
        app.ask_in_flight = true;
        trigger_ask(&mut app);
        assert!(app.ask_receiver.is_none());
        assert!(app.op_status.is_none());
        assert_eq!(app.focus, FocusTarget::QuestionCount);
    }

    #[test]
    fn generation_in_flight_ignores_a_duplicate_trigger() {
        let mut app = blank_app();
        app.quiz_generating = true;
        trigger_generate(&mut app);
        assert!(app.quiz_receiver.is_none());
        assert!(app.quiz_status.is_none());
        assert_eq!(app.generating_count, 0);
    }
}
