// File: src/prompt.rs
use crate::error::{DiagnosisError, Result};
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use tracing::debug;

/// Anything that can answer the session's questions.
pub trait InputSource {
    /// Asks until a yes or no comes back.
    fn ask_yes_no(&mut self, question: &str) -> Result<bool>;
    /// Asks once and returns the trimmed answer.
    fn ask_line(&mut self, question: &str) -> Result<String>;
}

/// Parses `y`, `yes`, `n`, `no` in any case.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Line-based prompts over any reader/writer pair (stdin/stdout in the binary).
pub struct ConsoleInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_answer(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{question} ")?;
        self.writer.flush()?;
        let mut input = String::new();
        if self.reader.read_line(&mut input)? == 0 {
            return Err(DiagnosisError::InputClosed);
        }
        Ok(input.trim().to_string())
    }
}

impl<R: BufRead, W: Write> InputSource for ConsoleInput<R, W> {
    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.read_answer(&format!("{question} (Y/N):"))?;
            match parse_yes_no(&answer) {
                Some(flag) => return Ok(flag),
                None => {
                    debug!(%answer, "rejected yes/no answer");
                    writeln!(self.writer, "Please answer Y or N.")?;
                }
            }
        }
    }

    fn ask_line(&mut self, question: &str) -> Result<String> {
        self.read_answer(question)
    }
}

/// Pre-recorded answers, consumed in order. Runs out with `InputClosed`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front().ok_or(DiagnosisError::InputClosed)
    }
}

impl InputSource for ScriptedInput {
    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.next(question)?;
            if let Some(flag) = parse_yes_no(&answer) {
                return Ok(flag);
            }
        }
    }

    fn ask_line(&mut self, question: &str) -> Result<String> {
        Ok(self.next(question)?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn yes_no_is_case_insensitive() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no(" yes "), Some(true));
        assert_eq!(parse_yes_no("No"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
        assert_eq!(parse_yes_no(""), None);
    }

    #[test]
    fn console_reprompts_until_valid() {
        let mut input = ConsoleInput::new(Cursor::new("what\n\nN\n"), Vec::new());
        assert!(!input.ask_yes_no("Do you have fever?").unwrap());
        let shown = String::from_utf8(input.into_writer()).unwrap();
        assert_eq!(shown.matches("Do you have fever? (Y/N):").count(), 3);
        assert_eq!(shown.matches("Please answer Y or N.").count(), 2);
    }

    #[test]
    fn console_eof_is_input_closed() {
        let mut input = ConsoleInput::new(Cursor::new("x\n"), Vec::new());
        assert!(matches!(input.ask_yes_no("Q?"), Err(DiagnosisError::InputClosed)));
    }

    #[test]
    fn scripted_skips_invalid_answers() {
        let mut input = ScriptedInput::new(["huh", "y", "  Cold  "]);
        assert!(input.ask_yes_no("fever?").unwrap());
        assert_eq!(input.ask_line("which?").unwrap(), "Cold");
        assert_eq!(input.asked.len(), 3);
        assert!(input.ask_line("again?").is_err());
    }
}
