//! HTML presentation of the demo page.
//!
//! Everything that turns a typed outcome into user-facing text or markup lives here;
//! the classifier and loader never produce display strings themselves.

use std::fmt;

use askama::Template;

use crate::classifier::{ClassificationResult, Classifier, ClassifierError, ErrorKind};
use crate::model_manager::{LoadError, LoadOutcome};

/// Visual category of the output region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Ham result
    Benign,
    /// Spam result
    Flagged,
    /// Input needs attention; the model was not consulted
    Warning,
    /// Classification failed
    Error,
}

impl Style {
    /// Inline CSS for the output region
    pub fn css(&self) -> &'static str {
        match self {
            Self::Benign => {
                "padding: 15px; border-radius: 5px; margin-top: 20px; \
                 background-color: rgba(0, 255, 0, 0.1); border: 1px solid green; color: green;"
            }
            Self::Flagged => {
                "padding: 15px; border-radius: 5px; margin-top: 20px; \
                 background-color: rgba(255, 0, 0, 0.1); border: 1px solid red; color: red;"
            }
            Self::Warning => "color: orange;",
            Self::Error => "color: red;",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::Flagged => "flagged",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// What the output region says.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayMessage {
    Classification { label: String, confidence: String },
    Text(String),
}

impl fmt::Display for DisplayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification { label, confidence } => {
                write!(f, "Classification: {} (Confidence: {})", label, confidence)
            }
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Maps a classify outcome to its message and style.
pub fn present(outcome: &Result<ClassificationResult, ClassifierError>) -> (DisplayMessage, Style) {
    match outcome {
        Ok(result) => {
            let style = if result.is_spam { Style::Flagged } else { Style::Benign };
            let message = DisplayMessage::Classification {
                label: result.label.to_string(),
                confidence: result.confidence_text(),
            };
            (message, style)
        }
        Err(e) => match e.kind() {
            ErrorKind::Validation => (DisplayMessage::Text(e.to_string()), Style::Warning),
            ErrorKind::Inference => (
                DisplayMessage::Text(format!("Error in classification: {}", e)),
                Style::Error,
            ),
        },
    }
}

/// Runs the classifier and presents the outcome in one step.
pub fn respond(classifier: &Classifier, text: Option<&str>) -> (DisplayMessage, Style) {
    present(&classifier.classify(text))
}

/// Text for the load-status region. Empty unless loading failed.
pub fn load_status_text(result: &Result<LoadOutcome, LoadError>) -> String {
    match result {
        Ok(_) => String::new(),
        Err(e) => format!("Error loading model: {}", e),
    }
}

/// Messages listed under the form, with whether each one is spam.
pub const EXAMPLE_MESSAGES: [(&str, bool); 4] = [
    ("WINNER!! As a valued network customer you have been selected to receivea £900 prize reward! Call this number immediately: +1234567890", true),
    ("Meeting rescheduled to 3 PM tomorrow. Please confirm attendance.", false),
    ("URGENT We are trying to contact you Last weekends draw shows u have won a £1000", true),
    ("Hi mom, could you pick me up after practice at 5?", false),
];

/// State needed to render the page once.
#[derive(Debug, Default)]
pub struct Page<'a> {
    pub title: &'a str,
    pub load_status: &'a str,
    /// Text to put back into the textarea
    pub message: Option<&'a str>,
    pub output: Option<(DisplayMessage, Style)>,
}

/// Renders `templates/page.html`. Every interpolated value is HTML-escaped.
pub fn render_page(page: &Page<'_>) -> Result<String, askama::Error> {
    PageTemplate {
        title: page.title,
        load_status: page.load_status,
        message: page.message.unwrap_or(""),
        output: page
            .output
            .as_ref()
            .map(|(message, style)| OutputView::new(message, *style)),
        examples: EXAMPLE_MESSAGES
            .iter()
            .map(|&(text, is_spam)| ExampleView {
                text,
                color: if is_spam { "red" } else { "green" },
            })
            .collect(),
    }
    .render()
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate<'a> {
    title: &'a str,
    load_status: &'a str,
    message: &'a str,
    output: Option<OutputView<'a>>,
    examples: Vec<ExampleView>,
}

#[derive(Clone, Copy)]
struct OutputView<'a> {
    class: &'static str,
    css: &'static str,
    /// Set for a classification; plain messages use `text`
    verdict: Option<Verdict<'a>>,
    text: &'a str,
}

impl<'a> OutputView<'a> {
    fn new(message: &'a DisplayMessage, style: Style) -> Self {
        let (verdict, text) = match message {
            DisplayMessage::Classification { label, confidence } => (
                Some(Verdict {
                    label: label.as_str(),
                    confidence: confidence.as_str(),
                }),
                "",
            ),
            DisplayMessage::Text(text) => (None, text.as_str()),
        };
        Self {
            class: style.as_str(),
            css: style.css(),
            verdict,
            text,
        }
    }
}

#[derive(Clone, Copy)]
struct Verdict<'a> {
    label: &'a str,
    confidence: &'a str,
}

struct ExampleView {
    text: &'static str,
    color: &'static str,
}
