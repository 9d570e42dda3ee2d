use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("read interactive input: {0}")]
    Read(#[from] std::io::Error),
}

/// Source of interactive answers. Flows that need user input take this as a
/// parameter so tests can script the whole exchange.
pub trait Prompt {
    /// Asks a question and returns the answer line, trimmed of the line
    /// ending. An empty answer means "accept the default".
    fn ask(&mut self, question: &str) -> Result<String, Error>;

    fn confirm(&mut self, question: &str) -> Result<bool, Error> {
        let answer = self.ask(question)?.to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Prompts on the controlling terminal via stdout/stdin.
pub struct Terminal;

impl Prompt for Terminal {
    fn ask(&mut self, question: &str) -> Result<String, Error> {
        print!("{question} ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed script of answers.
    pub struct Scripted {
        answers: VecDeque<String>,
    }

    impl Scripted {
        pub fn new<const N: usize>(answers: [&str; N]) -> Self {
            Scripted {
                answers: answers.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl Prompt for Scripted {
        fn ask(&mut self, question: &str) -> Result<String, Error> {
            match self.answers.pop_front() {
                Some(answer) => Ok(answer),
                None => panic!("unscripted prompt: {question}"),
            }
        }
    }
}
