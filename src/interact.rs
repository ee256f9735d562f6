//! Interactive prompts
//!
//! A question can be answered ahead of time through a configuration key;
//! otherwise the user is asked on stdin. Suggested answers can be accepted
//! with an empty line, `y` or `yes`.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::config::{Config, Value};
use crate::files::display_path;
use crate::logging::Log;

/// Candidate answer(s) offered with a question
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Suggestion {
    #[default]
    None,
    Scalar(Value),
    /// The first entry is the default
    List(Vec<Value>),
    /// Answers are keys; the values are what the user sees
    Mapping(Vec<(String, Value)>),
    Path(PathBuf),
}

impl From<Value> for Suggestion {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Suggestion::None,
            Value::List(items) => Suggestion::List(items),
            Value::Map(entries) => Suggestion::Mapping(entries),
            other => Suggestion::Scalar(other),
        }
    }
}

impl From<&str> for Suggestion {
    fn from(s: &str) -> Self {
        Suggestion::Scalar(Value::from(s))
    }
}

impl From<PathBuf> for Suggestion {
    fn from(path: PathBuf) -> Self {
        Suggestion::Path(path)
    }
}

/// A question to put to the user
#[derive(Debug, Clone, Default)]
pub struct Question {
    text: String,
    suggestion: Suggestion,
    default: Option<Value>,
    reference: Option<String>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn suggest(mut self, suggestion: impl Into<Suggestion>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Answer used for empty input, ahead of the suggestion
    pub fn default_answer(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Configuration key that can pre-answer this question
    pub fn reference(mut self, key: impl Into<String>) -> Self {
        self.reference = Some(key.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn suggestion(&self) -> &Suggestion {
        &self.suggestion
    }
}

/// A question together with the answer it received
#[derive(Debug, Clone, PartialEq)]
pub struct Answered {
    pub question: String,
    pub answer: Option<Value>,
    pub from_config: bool,
}

/// Asks questions on a reader/writer pair (stdin/stdout by default)
pub struct Prompter {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    cwd: PathBuf,
    answers: Vec<(String, Answered)>,
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter {
    pub fn new() -> Self {
        Self::with_io(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self {
            input,
            output,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            answers: Vec::new(),
        }
    }

    /// Directory path suggestions are shown relative to
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = cwd;
        self
    }

    /// Answers given to questions that carried a reference key
    pub fn answers(&self) -> impl Iterator<Item = (&str, &Answered)> {
        self.answers.iter().map(|(k, a)| (k.as_str(), a))
    }

    /// Ask a question and return the interpreted answer
    ///
    /// Blocks on input unless the referenced configuration key already holds
    /// a truthy value.
    pub fn ask<L: Log>(&mut self, log: &mut L, config: &Config, question: &Question) -> Option<Value> {
        let prompt = self.render(question);

        if let Some(reference) = &question.reference {
            let preset = config.get(reference);
            if preset.is_truthy() {
                log.print(format!(
                    "{} {} (from command line argument)",
                    prompt.trim_end().trim_end_matches(':'),
                    preset
                ));
                let answer = Some(preset.clone());
                self.remember(question, answer.clone(), true);
                return answer;
            }
        }

        log.flush();
        let raw = match self.read_line(&prompt) {
            Ok(raw) => raw,
            Err(e) => {
                log.warning(format!("Interact: Could not read answer: {}", e));
                return None;
            }
        };

        let answer = interpret(log, question, &raw);
        self.remember(question, answer.clone(), false);
        answer
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }

    fn remember(&mut self, question: &Question, answer: Option<Value>, from_config: bool) {
        let Some(reference) = &question.reference else {
            return;
        };
        let answered = Answered {
            question: question.text.clone(),
            answer,
            from_config,
        };
        match self.answers.iter_mut().find(|(k, _)| k == reference) {
            Some(slot) => slot.1 = answered,
            None => self.answers.push((reference.clone(), answered)),
        }
    }

    /// Format the prompt line, e.g. `Continue? (yes): `
    pub fn render(&self, question: &Question) -> String {
        let mut text = capitalize(question.text.trim());
        if !text.ends_with('?') {
            text.push('?');
        }
        let hint = match &question.suggestion {
            Suggestion::None => question.default.as_ref().map(|d| d.to_string()),
            Suggestion::Scalar(value) => Some(value.to_string()),
            Suggestion::List(items) => {
                Some(join_choices(items.iter().map(|item| item.to_string())))
            }
            Suggestion::Mapping(entries) => {
                Some(join_choices(entries.iter().map(|(_, value)| value.to_string())))
            }
            Suggestion::Path(path) => Some(display_path(path, &self.cwd)),
        };
        match hint {
            Some(hint) if !hint.is_empty() => format!("{} ({}): ", text, hint),
            _ => format!("{}: ", text),
        }
    }
}

/// Interpret a raw answer against the question's suggestion
///
/// Out-of-range answers to list or mapping suggestions produce a warning and
/// no answer.
pub fn interpret<L: Log>(log: &mut L, question: &Question, raw: &str) -> Option<Value> {
    let raw = raw.trim();

    if raw.is_empty() || raw == "y" || raw == "yes" {
        if let Some(default) = &question.default {
            return Some(default.clone());
        }
        match &question.suggestion {
            Suggestion::None => {}
            Suggestion::Scalar(value) => return Some(value.clone()),
            Suggestion::List(items) => return items.first().cloned(),
            Suggestion::Mapping(entries) => {
                return entries.first().map(|(key, _)| Value::from(key.as_str()))
            }
            Suggestion::Path(path) => return Some(Value::from(path.as_path())),
        }
        if raw.is_empty() {
            return None;
        }
    }

    match raw.to_lowercase().as_str() {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    let matched = match &question.suggestion {
        Suggestion::List(items) => items
            .iter()
            .find(|item| item.to_string().contains(raw))
            .cloned(),
        Suggestion::Mapping(entries) => entries
            .iter()
            .find(|(key, _)| key == raw)
            .or_else(|| {
                entries
                    .iter()
                    .find(|(_, value)| value.to_string().contains(raw))
            })
            .map(|(key, _)| Value::from(key.as_str())),
        _ => return Some(Value::from(raw)),
    };

    if matched.is_none() {
        log.warning(format!(
            "Interact: Answer '{}' is not one of the offered options.",
            raw
        ));
    }
    matched
}

fn join_choices(choices: impl Iterator<Item = String>) -> String {
    choices
        .enumerate()
        .map(|(i, choice)| if i == 0 { format!("[{}]", choice) } else { choice })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
