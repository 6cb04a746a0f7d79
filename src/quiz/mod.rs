//! Quiz core: question selection, the per-attempt state machine and scoring.

pub mod scoring;
pub mod session;
pub mod source;
pub mod timer;

pub use scoring::{Grade, ModeBonus, ScoreResult};
pub use session::{AnswerOutcome, AnsweredQuestion, QuizSession, QuizSetup, SessionState};
pub use source::QuestionBank;
