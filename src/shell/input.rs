// src/shell/input.rs

use std::io::Write;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::AppError;

/// What came back from a read that may have a deadline.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Line(String),
    TimedOut,
    /// Stdin was closed.
    Closed,
}

/// Line reader over stdin. `next_line` is cancel safe, so a read that
/// loses the race against a deadline drops no input.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `label` and waits for a trimmed line. `None` on EOF.
    pub async fn prompt(&mut self, label: &str) -> Result<Option<String>, AppError> {
        show_prompt(label)?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// Like `prompt`, but gives up at `deadline` when one is set.
    pub async fn prompt_until(
        &mut self,
        label: &str,
        deadline: Option<Instant>,
    ) -> Result<Reply, AppError> {
        show_prompt(label)?;

        let line = match deadline {
            None => self.lines.next_line().await?,
            Some(deadline) => {
                let deadline = tokio::time::Instant::from_std(deadline);
                match tokio::time::timeout_at(deadline, self.lines.next_line()).await {
                    Ok(line) => line?,
                    Err(_) => return Ok(Reply::TimedOut),
                }
            }
        };

        Ok(match line {
            Some(l) => Reply::Line(l.trim().to_string()),
            None => Reply::Closed,
        })
    }

    /// Keeps asking until the reply parses into one of `choices` (1-based).
    pub async fn choose<'a, T>(
        &mut self,
        title: &str,
        choices: &'a [T],
        label: impl Fn(&T) -> String,
    ) -> Result<Option<&'a T>, AppError> {
        println!("\n{}", title);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, label(choice));
        }

        loop {
            let Some(answer) = self.prompt("> ").await? else {
                return Ok(None);
            };
            match parse_choice(&answer, choices.len()) {
                Some(i) => return Ok(Some(&choices[i])),
                None => println!("Pick a number between 1 and {}.", choices.len()),
            }
        }
    }
}

/// 1-based menu number to 0-based index.
pub fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

fn show_prompt(label: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 4), Some(0));
        assert_eq!(parse_choice(" 4 ", 4), Some(3));
        assert_eq!(parse_choice("0", 4), None);
        assert_eq!(parse_choice("5", 4), None);
        assert_eq!(parse_choice("b", 4), None);
    }
}
