use std::{
    collections::VecDeque,
    io::{BufRead, Write},
};

use super::{
    fields::{Field, ValidationError},
    CaptureError,
};

/// Supplier of raw answers, one per requested field.
pub trait AnswerSource {
    /// Returns the raw text for `field`. Called again for the same field after a rejection.
    fn answer(&mut self, field: Field) -> Result<String, CaptureError>;

    /// Called with every rejected answer before the field is requested again.
    fn rejected(&mut self, _error: &ValidationError) {}

    /// Free-form notice, such as the heading before the stage-hours group.
    fn notice(&mut self, _message: &str) {}
}

/// Interactive source that prints prompts and reads one line per answer.
#[derive(Debug)]
pub struct ConsoleSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleSource<R, W> {
    /// Wraps a reader (usually locked stdin) and a writer (usually stdout).
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the source, returning the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> AnswerSource for ConsoleSource<R, W> {
    fn answer(&mut self, field: Field) -> Result<String, CaptureError> {
        write!(self.output, "{}", field.prompt())?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(CaptureError::SourceClosed { field });
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }

    fn rejected(&mut self, error: &ValidationError) {
        let _ = writeln!(self.output, "Invalid input: {error}. Please try again.");
    }

    fn notice(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}

/// Pre-collected answers replayed in order, recording every rejection.
#[derive(Debug, Default, Clone)]
pub struct ScriptedAnswers {
    answers: VecDeque<String>,
    asked: Vec<Field>,
    rejections: Vec<ValidationError>,
}

impl ScriptedAnswers {
    /// Creates a script from raw answers.
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fields requested so far, in order, including repeats.
    #[must_use]
    pub fn asked(&self) -> &[Field] {
        &self.asked
    }

    /// Rejections reported so far.
    #[must_use]
    pub fn rejections(&self) -> &[ValidationError] {
        &self.rejections
    }

    /// Answers not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl AnswerSource for ScriptedAnswers {
    fn answer(&mut self, field: Field) -> Result<String, CaptureError> {
        self.asked.push(field);
        self.answers
            .pop_front()
            .ok_or(CaptureError::SourceClosed { field })
    }

    fn rejected(&mut self, error: &ValidationError) {
        self.rejections.push(error.clone());
    }
}
