//! User decisions.
//!
//! The pipeline never talks to a terminal itself; it asks a [`Prompter`].
//! The CLI supplies an interactive one, `--yes` and tests use the ones here.

use std::collections::VecDeque;

use crate::error::SyncError;

pub trait Prompter {
    /// Pick one of `options`; returns its index.
    fn choose(&mut self, message: &str, options: &[String], default: usize) -> Result<usize, SyncError>;

    /// Free-form answer. An empty reply takes `default`.
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, SyncError>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, SyncError>;
}

/// Takes every default; a question without one is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDefaults;

impl Prompter for AcceptDefaults {
    fn choose(&mut self, _message: &str, options: &[String], default: usize) -> Result<usize, SyncError> {
        if default < options.len() {
            Ok(default)
        } else {
            Err(SyncError::Prompt("no options to choose from".into()))
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, SyncError> {
        default
            .map(str::to_string)
            .ok_or_else(|| SyncError::Prompt(format!("'{message}' needs an answer and has no default")))
    }

    fn confirm(&mut self, _message: &str, default: bool) -> Result<bool, SyncError> {
        Ok(default)
    }
}

/// One canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(usize),
    Text(String),
    Yes(bool),
    /// Take the question's default.
    Default,
}

/// Replays queued answers in order, then falls back to defaults.
///
/// Every question asked is recorded so tests can assert on the dialogue.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, message: &str) -> Answer {
        self.asked.push(message.to_string());
        self.answers.pop_front().unwrap_or(Answer::Default)
    }

    fn mismatch(message: &str, answer: &Answer) -> SyncError {
        SyncError::Prompt(format!("scripted answer {answer:?} does not fit '{message}'"))
    }
}

impl Prompter for Scripted {
    fn choose(&mut self, message: &str, options: &[String], default: usize) -> Result<usize, SyncError> {
        match self.next(message) {
            Answer::Choice(i) if i < options.len() => Ok(i),
            Answer::Default => AcceptDefaults.choose(message, options, default),
            other => Err(Self::mismatch(message, &other)),
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, SyncError> {
        match self.next(message) {
            Answer::Text(text) if text.is_empty() => AcceptDefaults.input(message, default),
            Answer::Text(text) => Ok(text),
            Answer::Default => AcceptDefaults.input(message, default),
            other => Err(Self::mismatch(message, &other)),
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, SyncError> {
        match self.next(message) {
            Answer::Yes(yes) => Ok(yes),
            Answer::Default => Ok(default),
            other => Err(Self::mismatch(message, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_defaults_requires_a_default_for_input() {
        let mut p = AcceptDefaults;
        assert_eq!(p.input("namespace", Some("Target.Foo")).unwrap(), "Target.Foo");
        assert!(matches!(p.input("namespace", None), Err(SyncError::Prompt(_))));
        assert!(p.confirm("save?", true).unwrap());
        assert!(p.choose("pick", &[], 0).is_err());
    }

    #[test]
    fn scripted_replays_then_defaults() {
        let mut p = Scripted::new([Answer::Text("Other".into()), Answer::Yes(false)]);
        assert_eq!(p.input("type", Some("Bar")).unwrap(), "Other");
        assert!(!p.confirm("save?", true).unwrap());
        assert_eq!(p.choose("pick", &["a".into(), "b".into()], 1).unwrap(), 1);
        assert_eq!(p.asked, vec!["type", "save?", "pick"]);
    }

    #[test]
    fn scripted_rejects_wrong_answer_kind() {
        let mut p = Scripted::new([Answer::Yes(true)]);
        assert!(p.input("type", Some("Bar")).is_err());
    }
}
