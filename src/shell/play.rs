// src/shell/play.rs

use std::collections::BTreeSet;
use std::time::Instant;

use rand::Rng;

use crate::{
    error::AppError,
    models::question::{OPTION_COUNT, Question},
    quiz::{
        AnswerOutcome, QuizSession, ScoreResult,
        scoring::ModeBonus,
        session::QuizSetup,
    },
    shell::input::{Input, Reply, parse_choice},
};

const OPTION_LABELS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

/// Drives one session to the end. `Ok(None)` when the learner quits early;
/// an abandoned session is dropped without being scored.
pub async fn run_quiz<R: Rng + ?Sized>(
    input: &mut Input,
    setup: QuizSetup,
    questions: Vec<Question>,
    rng: &mut R,
    bell: bool,
) -> Result<Option<(QuizSession, ScoreResult)>, AppError> {
    let mut session = QuizSession::start(setup, questions, Instant::now())?;
    let mut shown = None;

    while !session.is_finished() {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        // Hints and bad replies re-prompt without redrawing the question.
        if shown != session.question_number() {
            show_question(&session, &question);
            shown = session.question_number();
        }

        let reply = input
            .prompt_until("Answer (A-D, h = hint, q = quit): ", session.deadline())
            .await?;

        let outcome = match reply {
            Reply::Closed => return Ok(None),
            Reply::TimedOut => {
                println!("\nTime's up!");
                session.expire(Instant::now())?
            }
            Reply::Line(line) => match line.to_ascii_lowercase().as_str() {
                "q" => {
                    tracing::info!("Quiz abandoned at question {:?}", session.question_number());
                    return Ok(None);
                }
                "h" => {
                    match session.use_hint(rng) {
                        Ok(removed) => {
                            println!("Removed options {}.", labels(&removed));
                            for line in option_lines(&question, session.eliminated()) {
                                println!("{}", line);
                            }
                        }
                        Err(e) => println!("{}", e),
                    }
                    continue;
                }
                answer => match parse_answer(answer) {
                    Some(i) if session.eliminated().contains(&i) => {
                        println!("Option {} was eliminated.", OPTION_LABELS[i]);
                        continue;
                    }
                    Some(i) => session.submit(i, Instant::now())?,
                    None => {
                        println!("Type A, B, C or D.");
                        continue;
                    }
                },
            },
        };

        show_feedback(&session, &outcome, bell);
    }

    let result = session.finalize()?;
    show_result(&result);
    Ok(Some((session, result)))
}

/// Accepts a letter or a 1-based number.
pub fn parse_answer(answer: &str) -> Option<usize> {
    let answer = answer.trim();
    let mut chars = answer.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(i) = OPTION_LABELS
            .iter()
            .position(|l| l.eq_ignore_ascii_case(&c))
        {
            return Some(i);
        }
    }
    parse_choice(answer, OPTION_COUNT)
}

fn labels(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| OPTION_LABELS[i].to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn show_question(session: &QuizSession, question: &Question) {
    let number = session.question_number().unwrap_or(0);
    println!(
        "\n[{}/{}] {} ({})",
        number,
        session.total_questions(),
        session.category(),
        session.difficulty()
    );

    let mut status = format!("Hints: {}", session.hints_remaining());
    if let Some(lives) = session.lives_remaining() {
        status.push_str(&format!("  Lives: {}", lives));
    }
    if let Some(left) = session.remaining_time(Instant::now()) {
        status.push_str(&format!("  Time: {}s", left.as_secs()));
    }
    println!("{}", status);

    println!("{}", question.prompt);
    for line in option_lines(question, session.eliminated()) {
        println!("{}", line);
    }
}

/// One line per option; eliminated ones are blanked out.
pub fn option_lines(question: &Question, eliminated: &BTreeSet<usize>) -> Vec<String> {
    question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            if eliminated.contains(&i) {
                format!("  {}. ---", OPTION_LABELS[i])
            } else {
                format!("  {}. {}", OPTION_LABELS[i], option)
            }
        })
        .collect()
}

fn show_feedback(session: &QuizSession, outcome: &AnswerOutcome, bell: bool) {
    if bell {
        print!("\x07");
    }

    if outcome.is_correct {
        print!("Correct!");
        if let Some(bonus) = outcome.time_bonus.filter(|b| *b > 0) {
            print!(" +{} time bonus", bonus);
        }
        if outcome.streak >= 3 {
            print!(" ({} in a row)", outcome.streak);
        }
        println!();
    } else {
        println!(
            "Wrong. The answer was {}.",
            OPTION_LABELS[outcome.correct_index]
        );
    }

    if !outcome.explanation.is_empty() {
        println!("{}", outcome.explanation);
    }
    if outcome.game_over {
        println!("Out of lives after {} questions.", session.answers().len());
    }
}

fn show_result(result: &ScoreResult) {
    println!("\n=== {} ===", result.grade.label());
    println!(
        "{} / {} correct ({:.1}%)",
        result.correct, result.total_questions, result.percentage
    );
    println!("Score: {}", result.score);
    match result.bonus {
        ModeBonus::TimeBonus { total } => println!("Time bonus: {}", total),
        ModeBonus::SurvivalMultiplier { applied: true } => println!("Survival x1.5 applied"),
        ModeBonus::SurvivalMultiplier { applied: false } | ModeBonus::None => {}
    }
    println!("Best streak: {}", result.best_streak);
    println!("Time: {:.1}s", result.elapsed_secs);
    println!("{}", result.grade.message());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_letters_and_numbers() {
        assert_eq!(parse_answer("a"), Some(0));
        assert_eq!(parse_answer("D"), Some(3));
        assert_eq!(parse_answer("2"), Some(1));
        assert_eq!(parse_answer("e"), None);
        assert_eq!(parse_answer("ab"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_option_lines_blank_eliminated() {
        let question = Question::new(
            "Science",
            crate::models::question::Difficulty::Easy,
            "Pick one",
            ["w", "x", "y", "z"],
            1,
            "",
        )
        .unwrap();

        let all = option_lines(&question, &BTreeSet::new());
        assert_eq!(all, vec!["  A. w", "  B. x", "  C. y", "  D. z"]);

        let hinted = option_lines(&question, &BTreeSet::from([0, 3]));
        assert_eq!(hinted, vec!["  A. ---", "  B. x", "  C. y", "  D. ---"]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(labels(&[0, 2]), "A, C");
    }
}
