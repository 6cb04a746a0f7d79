// src/quiz/session.rs

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use validator::Validate;

use crate::{
    config::{MAX_HINTS, QUESTION_TIME_LIMIT_SECS, SURVIVAL_LIVES},
    error::AppError,
    models::{
        mode::Mode,
        question::{Difficulty, OPTION_COUNT, Question},
    },
    quiz::{
        scoring::{self, ModeBonus, ScoreResult},
        timer::Countdown,
    },
};

/// Options a hint removes from the current question.
const HINT_ELIMINATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Waiting for an answer to the question at this index.
    AwaitingAnswer(usize),
    Finished,
}

/// What the learner chose. `selected` is `None` when time ran out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub selected: Option<usize>,
    pub is_correct: bool,
    pub elapsed_secs: f64,
}

/// Per-question feedback returned by `submit` and `expire`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    pub elapsed_secs: f64,
    /// Bonus earned by this answer, Timed mode only.
    pub time_bonus: Option<u32>,
    pub streak: u32,
    /// State after the transition.
    pub state: SessionState,
    /// True when a Survival run just ran out of lives.
    pub game_over: bool,
}

/// Selection criteria a session was started with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSetup {
    pub category: String,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub count: usize,
}

/// One quiz attempt. Owned by whoever drives the quiz and discarded after
/// the result is recorded. All mutation goes through `submit`, `expire`
/// and `use_hint`; none of them succeed once the session is `Finished`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    setup: QuizSetup,
    questions: Vec<Question>,
    state: SessionState,
    correct: u32,
    wrong: u32,
    time_bonuses: Vec<u32>,
    streak: u32,
    best_streak: u32,
    total_elapsed: f64,
    countdown: Countdown,
    hints_remaining: u32,
    eliminated: BTreeSet<usize>,
    answers: Vec<AnsweredQuestion>,
}

impl QuizSession {
    /// Starts a session on an already selected question list.
    /// The first question's clock starts at `at`.
    pub fn start(setup: QuizSetup, questions: Vec<Question>, at: Instant) -> Result<Self, AppError> {
        if questions.is_empty() {
            return Err(AppError::EmptySelection(format!(
                "no {} questions in category '{}'",
                setup.difficulty, setup.category
            )));
        }
        for q in &questions {
            q.validate()?;
        }

        let limit = match setup.mode {
            Mode::Timed => Some(Duration::from_secs(QUESTION_TIME_LIMIT_SECS)),
            Mode::Practice | Mode::Survival => None,
        };

        tracing::debug!(
            "Starting {} quiz: {} x {} {}",
            setup.mode,
            questions.len(),
            setup.difficulty,
            setup.category
        );

        Ok(Self {
            setup,
            questions,
            state: SessionState::AwaitingAnswer(0),
            correct: 0,
            wrong: 0,
            time_bonuses: Vec::new(),
            streak: 0,
            best_streak: 0,
            total_elapsed: 0.0,
            countdown: Countdown::start(at, limit),
            hints_remaining: MAX_HINTS,
            eliminated: BTreeSet::new(),
            answers: Vec::new(),
        })
    }

    /// Answers the current question with option `selected` at instant `at`.
    ///
    /// A Timed answer that arrives after the countdown but before `expire`
    /// was called is still scored, with no time bonus beyond what its
    /// elapsed time earns.
    pub fn submit(&mut self, selected: usize, at: Instant) -> Result<AnswerOutcome, AppError> {
        let index = self.current_index()?;
        if selected >= OPTION_COUNT {
            return Err(AppError::InvalidTransition(format!(
                "option {} is out of range 0..{}",
                selected, OPTION_COUNT
            )));
        }

        let elapsed = self.countdown.elapsed(at).as_secs_f64();
        let is_correct = selected == self.questions[index].correct_index;
        Ok(self.record_answer(index, Some(selected), is_correct, elapsed, at))
    }

    /// Times out the current question. Only valid in Timed mode once the
    /// per-question budget is used up. Counts as a wrong answer taking the
    /// full time limit.
    pub fn expire(&mut self, at: Instant) -> Result<AnswerOutcome, AppError> {
        let index = self.current_index()?;
        if self.setup.mode != Mode::Timed {
            return Err(AppError::InvalidTransition(format!(
                "questions do not expire in {} mode",
                self.setup.mode
            )));
        }
        if !self.countdown.is_expired(at) {
            return Err(AppError::InvalidTransition(
                "time limit has not elapsed yet".to_string(),
            ));
        }

        let elapsed = QUESTION_TIME_LIMIT_SECS as f64;
        Ok(self.record_answer(index, None, false, elapsed, at))
    }

    /// Removes two wrong options from the current question.
    ///
    /// Returns the eliminated indices. Refused when no hints are left or the
    /// current question already had options eliminated.
    pub fn use_hint<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<usize>, AppError> {
        let index = self.current_index()?;
        if self.hints_remaining == 0 {
            return Err(AppError::InvalidTransition("no hints remaining".to_string()));
        }
        if !self.eliminated.is_empty() {
            return Err(AppError::InvalidTransition(
                "a hint was already used on this question".to_string(),
            ));
        }

        let wrong = self.questions[index].wrong_indices();
        let mut picked: Vec<usize> = wrong
            .choose_multiple(rng, HINT_ELIMINATIONS)
            .copied()
            .collect();
        picked.sort_unstable();

        self.eliminated.extend(picked.iter().copied());
        self.hints_remaining -= 1;
        tracing::debug!("Hint on question {} eliminated {:?}", index, picked);
        Ok(picked)
    }

    /// Computes the final result. Only valid once the session is `Finished`.
    pub fn finalize(&self) -> Result<ScoreResult, AppError> {
        if self.state != SessionState::Finished {
            return Err(AppError::NotFinished);
        }

        let total_questions = self.answers.len() as u32;
        let difficulty = self.setup.difficulty;
        let base = scoring::base_score(self.correct, difficulty);

        let (score, bonus) = match self.setup.mode {
            Mode::Practice => (base, ModeBonus::None),
            Mode::Timed => {
                let total: u32 = self.time_bonuses.iter().sum();
                (base + total, ModeBonus::TimeBonus { total })
            }
            Mode::Survival => {
                let score = scoring::survival_score(self.correct, difficulty);
                let applied = self.correct >= scoring::SURVIVAL_COMBO_THRESHOLD;
                (score, ModeBonus::SurvivalMultiplier { applied })
            }
        };

        let percentage = scoring::percentage(self.correct, total_questions);

        Ok(ScoreResult {
            total_questions,
            correct: self.correct,
            wrong: self.wrong,
            score,
            percentage,
            grade: scoring::grade_info(percentage),
            elapsed_secs: self.total_elapsed,
            bonus,
            best_streak: self.best_streak,
        })
    }

    fn current_index(&self) -> Result<usize, AppError> {
        match self.state {
            SessionState::AwaitingAnswer(i) => Ok(i),
            SessionState::Finished => Err(AppError::InvalidTransition(
                "quiz is already finished".to_string(),
            )),
        }
    }

    /// Shared tail of `submit` and `expire`.
    fn record_answer(
        &mut self,
        index: usize,
        selected: Option<usize>,
        is_correct: bool,
        elapsed: f64,
        at: Instant,
    ) -> AnswerOutcome {
        self.total_elapsed += elapsed;

        let mut time_bonus = None;
        if is_correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            if self.setup.mode == Mode::Timed {
                let bonus = scoring::time_bonus(elapsed);
                self.time_bonuses.push(bonus);
                time_bonus = Some(bonus);
            }
        } else {
            self.wrong += 1;
            self.streak = 0;
        }

        let question = self.questions[index].clone();
        let correct_index = question.correct_index;
        let explanation = question.explanation.clone();
        self.answers.push(AnsweredQuestion {
            question,
            selected,
            is_correct,
            elapsed_secs: elapsed,
        });

        let game_over = self.setup.mode == Mode::Survival && self.wrong >= SURVIVAL_LIVES;
        self.state = if game_over || index + 1 >= self.questions.len() {
            SessionState::Finished
        } else {
            self.countdown.restart(at);
            self.eliminated.clear();
            SessionState::AwaitingAnswer(index + 1)
        };

        tracing::debug!(
            "Question {} answered: correct={} elapsed={:.2}s -> {:?}",
            index,
            is_correct,
            elapsed,
            self.state
        );

        AnswerOutcome {
            is_correct,
            correct_index,
            explanation,
            elapsed_secs: elapsed,
            time_bonus,
            streak: self.streak,
            state: self.state,
            game_over,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::AwaitingAnswer(i) => self.questions.get(i),
            SessionState::Finished => None,
        }
    }

    /// 1-based position of the current question.
    pub fn question_number(&self) -> Option<usize> {
        match self.state {
            SessionState::AwaitingAnswer(i) => Some(i + 1),
            SessionState::Finished => None,
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn setup(&self) -> &QuizSetup {
        &self.setup
    }

    pub fn category(&self) -> &str {
        &self.setup.category
    }

    pub fn difficulty(&self) -> Difficulty {
        self.setup.difficulty
    }

    pub fn mode(&self) -> Mode {
        self.setup.mode
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    pub fn eliminated(&self) -> &BTreeSet<usize> {
        &self.eliminated
    }

    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    pub fn time_bonuses(&self) -> &[u32] {
        &self.time_bonuses
    }

    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    /// Lives left in a Survival run.
    pub fn lives_remaining(&self) -> Option<u32> {
        (self.setup.mode == Mode::Survival).then(|| SURVIVAL_LIVES.saturating_sub(self.wrong))
    }

    /// Time left on the current question, Timed mode only.
    pub fn remaining_time(&self, at: Instant) -> Option<Duration> {
        if self.is_finished() {
            return None;
        }
        self.countdown.remaining(at)
    }

    /// Instant the current question expires, Timed mode only.
    pub fn deadline(&self) -> Option<Instant> {
        if self.is_finished() {
            return None;
        }
        self.countdown.deadline()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    "Science",
                    Difficulty::Medium,
                    format!("Question {}", i),
                    ["a", "b", "c", "d"],
                    i % 4,
                    format!("Because {}", i),
                )
                .unwrap()
            })
            .collect()
    }

    fn setup(mode: Mode) -> QuizSetup {
        QuizSetup {
            category: "Science".to_string(),
            difficulty: Difficulty::Medium,
            mode,
            count: 10,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn answer_correct(session: &mut QuizSession, at: Instant) -> AnswerOutcome {
        let correct = session.current_question().unwrap().correct_index;
        session.submit(correct, at).unwrap()
    }

    fn answer_wrong(session: &mut QuizSession, at: Instant) -> AnswerOutcome {
        let correct = session.current_question().unwrap().correct_index;
        session.submit((correct + 1) % 4, at).unwrap()
    }

    #[test]
    fn test_empty_selection_is_refused() {
        let result = QuizSession::start(setup(Mode::Practice), Vec::new(), Instant::now());
        assert!(matches!(result, Err(AppError::EmptySelection(_))));
    }

    #[test]
    fn test_practice_run_to_finish() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Practice), questions(3), t0).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingAnswer(0));
        assert!(matches!(session.finalize(), Err(AppError::NotFinished)));

        let first = answer_correct(&mut session, t0 + secs(2.0));
        assert!(first.is_correct);
        assert_eq!(first.explanation, "Because 0");
        assert_eq!(first.time_bonus, None);
        assert_eq!(first.state, SessionState::AwaitingAnswer(1));

        answer_wrong(&mut session, t0 + secs(5.0));
        let last = answer_correct(&mut session, t0 + secs(6.0));
        assert_eq!(last.state, SessionState::Finished);

        let result = session.finalize().unwrap();
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.correct, 2);
        assert_eq!(result.wrong, 1);
        assert_eq!(result.score, 30);
        assert!((result.elapsed_secs - 6.0).abs() < 1e-6);
        assert_eq!(result.bonus, ModeBonus::None);
        assert_eq!(result.grade, scoring::Grade::Average);
    }

    #[test]
    fn test_streak_resets_on_wrong() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Practice), questions(5), t0).unwrap();
        answer_correct(&mut session, t0);
        let second = answer_correct(&mut session, t0);
        assert_eq!(second.streak, 2);
        let third = answer_wrong(&mut session, t0);
        assert_eq!(third.streak, 0);
        answer_correct(&mut session, t0);
        answer_correct(&mut session, t0);
        assert_eq!(session.finalize().unwrap().best_streak, 2);
    }

    #[test]
    fn test_submit_after_finish_and_bad_index() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Practice), questions(1), t0).unwrap();
        assert!(matches!(session.submit(4, t0), Err(AppError::InvalidTransition(_))));
        assert_eq!(session.answers().len(), 0);

        answer_correct(&mut session, t0);
        assert!(session.is_finished());
        assert!(matches!(session.submit(0, t0), Err(AppError::InvalidTransition(_))));
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_survival_ends_after_three_wrong() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Survival), questions(10), t0).unwrap();
        assert_eq!(session.lives_remaining(), Some(3));

        answer_wrong(&mut session, t0);
        let second = answer_wrong(&mut session, t0);
        assert!(!second.game_over);
        assert_eq!(session.lives_remaining(), Some(1));
        let third = answer_wrong(&mut session, t0);
        assert!(third.game_over);
        assert_eq!(third.state, SessionState::Finished);

        assert_eq!(session.answers().len(), 3);
        let result = session.finalize().unwrap();
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.bonus, ModeBonus::SurvivalMultiplier { applied: false });
    }

    #[test]
    fn test_survival_multiplier() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Survival), questions(5), t0).unwrap();
        for _ in 0..5 {
            answer_correct(&mut session, t0);
        }
        let result = session.finalize().unwrap();
        assert_eq!(result.correct, 5);
        assert_eq!(result.score, 112);
        assert_eq!(result.bonus, ModeBonus::SurvivalMultiplier { applied: true });
    }

    #[test]
    fn test_timed_bonuses_follow_elapsed_time() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Timed), questions(3), t0).unwrap();

        let t1 = t0 + secs(9.5);
        answer_correct(&mut session, t1);
        let t2 = t1 + secs(15.0);
        answer_correct(&mut session, t2);
        let t3 = t2 + secs(25.0);
        answer_correct(&mut session, t3);

        assert_eq!(session.time_bonuses(), &[5, 3, 0]);
        let result = session.finalize().unwrap();
        assert_eq!(result.score, 3 * 15 + 8);
        assert_eq!(result.bonus, ModeBonus::TimeBonus { total: 8 });
    }

    #[test]
    fn test_expire_counts_as_wrong_answer() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Timed), questions(2), t0).unwrap();
        answer_correct(&mut session, t0 + secs(1.0));
        assert_eq!(session.streak(), 1);

        let t1 = t0 + secs(1.0);
        assert!(matches!(
            session.expire(t1 + secs(14.0)),
            Err(AppError::InvalidTransition(_))
        ));

        let outcome = session.expire(t1 + secs(15.0)).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.streak, 0);
        assert_eq!(outcome.state, SessionState::Finished);

        let last = session.answers().last().unwrap();
        assert_eq!(last.selected, None);
        assert!(!last.is_correct);
        assert_eq!(last.elapsed_secs, 15.0);
        assert_eq!(session.wrong(), 1);
        assert!((session.total_elapsed() - 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_expire_only_in_timed_mode() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Practice), questions(2), t0).unwrap();
        assert!(matches!(
            session.expire(t0 + secs(60.0)),
            Err(AppError::InvalidTransition(_))
        ));
        assert_eq!(session.remaining_time(t0), None);
    }

    #[test]
    fn test_countdown_restarts_per_question() {
        let t0 = Instant::now();
        let mut session = QuizSession::start(setup(Mode::Timed), questions(2), t0).unwrap();
        assert_eq!(session.remaining_time(t0 + secs(5.0)), Some(secs(10.0)));

        let t1 = t0 + secs(12.0);
        answer_correct(&mut session, t1);
        assert_eq!(session.deadline(), Some(t1 + secs(15.0)));
        assert_eq!(session.remaining_time(t1), Some(secs(15.0)));
    }

    #[test]
    fn test_hint_eliminates_two_wrong_options() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = QuizSession::start(setup(Mode::Practice), questions(4), t0).unwrap();

        let correct = session.current_question().unwrap().correct_index;
        let removed = session.use_hint(&mut rng).unwrap();
        assert_eq!(removed.len(), 2);
        assert_ne!(removed[0], removed[1]);
        assert!(!removed.contains(&correct));
        assert_eq!(session.hints_remaining(), 2);
        assert_eq!(session.eliminated().len(), 2);

        // second hint on the same question is refused and costs nothing
        assert!(matches!(session.use_hint(&mut rng), Err(AppError::InvalidTransition(_))));
        assert_eq!(session.hints_remaining(), 2);

        answer_correct(&mut session, t0);
        assert!(session.eliminated().is_empty());
    }

    #[test]
    fn test_hint_budget_runs_out() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = QuizSession::start(setup(Mode::Practice), questions(5), t0).unwrap();
        for _ in 0..3 {
            session.use_hint(&mut rng).unwrap();
            answer_correct(&mut session, t0);
        }
        assert_eq!(session.hints_remaining(), 0);
        assert!(matches!(session.use_hint(&mut rng), Err(AppError::InvalidTransition(_))));
    }
}
