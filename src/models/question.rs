// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Points awarded per correct answer.
    pub fn points(self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AppError::BadRequest(format!("Unknown difficulty '{}'", other))),
        }
    }
}

/// Lets `FromRow` decode the TEXT column.
impl TryFrom<String> for Difficulty {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A multiple-choice question from the bank. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1, max = 100))]
    pub category: String,

    pub difficulty: Difficulty,

    /// The text shown to the learner.
    /// Stored under `question` in the bank file.
    #[serde(rename = "question")]
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,

    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    /// Index into `options`.
    #[serde(rename = "correct")]
    #[validate(range(max = 3))]
    pub correct_index: usize,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub explanation: String,
}

impl Question {
    /// Builds a question, rejecting anything that breaks the 4-option invariant.
    pub fn new(
        category: impl Into<String>,
        difficulty: Difficulty,
        prompt: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, AppError> {
        let question = Self {
            category: category.into(),
            difficulty,
            prompt: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index,
            explanation: explanation.into(),
        };
        question.validate()?;
        Ok(question)
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    /// Option indices other than the correct one.
    pub fn wrong_indices(&self) -> Vec<usize> {
        (0..OPTION_COUNT).filter(|&i| i != self.correct_index).collect()
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTION_COUNT {
        return Err(validator::ValidationError::new("options_must_have_four_entries"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range_answer() {
        let result = Question::new("Science", Difficulty::Easy, "Q?", ["a", "b", "c", "d"], 4, "");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_deserialize_bank_format() {
        let json = r#"{
            "category": "Science",
            "difficulty": "Hard",
            "question": "What is H2O?",
            "options": ["Water", "Salt", "Gold", "Iron"],
            "correct": 0,
            "explanation": "Two hydrogens, one oxygen."
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.validate().is_ok());
        assert_eq!(q.difficulty, Difficulty::Hard);
        assert_eq!(q.prompt, "What is H2O?");
        assert_eq!(q.correct_option(), "Water");
        assert_eq!(q.wrong_indices(), vec![1, 2, 3]);
    }

    #[test]
    fn test_three_options_fail_validation() {
        let q = Question {
            category: "Math".to_string(),
            difficulty: Difficulty::Medium,
            prompt: "1+1?".to_string(),
            options: vec!["1".into(), "2".into(), "3".into()],
            correct_index: 1,
            explanation: String::new(),
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_difficulty_points_and_parse() {
        assert_eq!(Difficulty::Easy.points(), 10);
        assert_eq!(Difficulty::Medium.points(), 15);
        assert_eq!(Difficulty::Hard.points(), 25);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
