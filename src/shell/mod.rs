// src/shell/mod.rs

//! Terminal front end. Owns the config, the question bank and the RNG, and
//! wires finished sessions into history, streaks and achievements.

pub mod input;
pub mod play;

use chrono::Local;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, LEADERBOARD_SIZE},
    error::AppError,
    models::{
        mode::Mode,
        question::Difficulty,
        quiz_record::NewQuizRecord,
        user::{CreateUserRequest, LoginRequest, User},
    },
    quiz::{
        QuestionBank, QuizSession, QuizSetup, ScoreResult,
        scoring,
    },
    state::AppState,
    store::{HistoryStore, achievements, settings, users},
};

use input::Input;

const DAILY_CHALLENGE_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainAction {
    Play,
    DailyChallenge,
    History,
    Leaderboard,
    Analytics,
    Achievements,
    Settings,
    Export,
    Logout,
}

impl MainAction {
    const ALL: [MainAction; 9] = [
        MainAction::Play,
        MainAction::DailyChallenge,
        MainAction::History,
        MainAction::Leaderboard,
        MainAction::Analytics,
        MainAction::Achievements,
        MainAction::Settings,
        MainAction::Export,
        MainAction::Logout,
    ];

    fn label(&self) -> String {
        let label = match self {
            MainAction::Play => "Start a quiz",
            MainAction::DailyChallenge => "Daily challenge",
            MainAction::History => "My history",
            MainAction::Leaderboard => "Leaderboard",
            MainAction::Analytics => "Analytics",
            MainAction::Achievements => "Achievements",
            MainAction::Settings => "Settings",
            MainAction::Export => "Export history",
            MainAction::Logout => "Log out",
        };
        label.to_string()
    }
}

pub struct Shell {
    state: AppState,
    bank: QuestionBank,
    input: Input,
    rng: StdRng,
}

impl Shell {
    pub fn new(state: AppState, bank: QuestionBank) -> Self {
        Self {
            state,
            bank,
            input: Input::stdin(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Runs until the learner quits or stdin closes.
    pub async fn run(mut self) -> Result<(), AppError> {
        println!("Welcome to the quiz! {} questions loaded.", self.bank.questions().len());

        while let Some(user) = self.account_menu().await? {
            println!("\nHello, {}!", user.username);
            if !self.main_menu(&user).await? {
                break;
            }
        }

        println!("Goodbye.");
        Ok(())
    }

    async fn account_menu(&mut self) -> Result<Option<User>, AppError> {
        const CHOICES: [&str; 3] = ["Log in", "Register", "Quit"];
        loop {
            let Some(choice) = self.input.choose("Account", &CHOICES, |c| c.to_string()).await?
            else {
                return Ok(None);
            };
            if *choice == "Quit" {
                return Ok(None);
            }

            let Some(username) = self.input.prompt("Username: ").await? else {
                return Ok(None);
            };
            let Some(password) = self.input.prompt("Password: ").await? else {
                return Ok(None);
            };

            let result = if *choice == "Register" {
                users::register(&self.state.pool, &CreateUserRequest { username, password }).await
            } else {
                users::authenticate(&self.state.pool, &LoginRequest { username, password }).await
            };

            match result {
                Ok(user) => return Ok(Some(user)),
                Err(e) => println!("{}", e),
            }
        }
    }

    /// `Ok(false)` when stdin closed and the shell should stop.
    async fn main_menu(&mut self, user: &User) -> Result<bool, AppError> {
        loop {
            let Some(action) = self
                .input
                .choose("Main menu", &MainAction::ALL, MainAction::label)
                .await?
                .copied()
            else {
                return Ok(false);
            };

            let outcome = match action {
                MainAction::Play => self.play(user).await,
                MainAction::DailyChallenge => self.daily_challenge(user).await,
                MainAction::History => self.show_history(user).await,
                MainAction::Leaderboard => self.show_leaderboard().await,
                MainAction::Analytics => self.show_analytics(user).await,
                MainAction::Achievements => self.show_achievements(user).await,
                MainAction::Settings => self.edit_settings(user).await,
                MainAction::Export => self.export(user).await,
                MainAction::Logout => return Ok(true),
            };

            // Storage failures end the screen, not the program.
            if let Err(e) = outcome {
                tracing::error!("{:?} failed: {}", action, e);
                println!("{}", e);
            }
        }
    }

    async fn play(&mut self, user: &User) -> Result<(), AppError> {
        let categories = self.bank.categories();
        let Some(category) = self
            .input
            .choose("Category", &categories, |c| c.to_string())
            .await?
            .cloned()
        else {
            return Ok(());
        };

        let counts: Vec<(Difficulty, usize)> = Difficulty::ALL
            .into_iter()
            .map(|d| (d, self.bank.count(Some(&category), Some(d))))
            .collect();
        let Some(&(difficulty, _)) = self
            .input
            .choose("Difficulty", &counts, |(d, n)| format!("{} ({} questions)", d, n))
            .await?
        else {
            return Ok(());
        };

        let Some(&mode) = self
            .input
            .choose("Mode", &Mode::ALL, |m| m.to_string())
            .await?
        else {
            return Ok(());
        };

        let setup = QuizSetup {
            category,
            difficulty,
            mode,
            count: DEFAULT_QUESTION_COUNT,
        };
        self.run_session(user, setup).await.map(|_| ())
    }

    async fn daily_challenge(&mut self, user: &User) -> Result<(), AppError> {
        let today = Local::now().date_naive();
        if !settings::can_play_daily_challenge(&self.state.pool, &user.username, today).await? {
            println!("You already completed today's challenge. Come back tomorrow!");
            return Ok(());
        }

        let categories = self.bank.categories();
        let Some(category) = categories.choose(&mut self.rng).cloned() else {
            println!("The question bank is empty.");
            return Ok(());
        };
        println!("\nToday's challenge: {} ({})", category, Difficulty::Medium);

        let setup = QuizSetup {
            category,
            difficulty: Difficulty::Medium,
            mode: Mode::Timed,
            count: DAILY_CHALLENGE_COUNT,
        };
        if self.run_session(user, setup).await?.is_some() {
            settings::complete_daily_challenge(&self.state.pool, &user.username, today).await?;
        }
        Ok(())
    }

    /// Plays one quiz and persists its result. `Ok(None)` when it was abandoned.
    async fn run_session(
        &mut self,
        user: &User,
        setup: QuizSetup,
    ) -> Result<Option<ScoreResult>, AppError> {
        let questions = self.bank.select(
            &setup.category,
            setup.difficulty,
            setup.count,
            &mut self.rng,
        );

        let prefs = settings::get(&self.state.pool, &user.username).await?;
        let bell = self.state.config.sound_enabled && prefs.sound_enabled;

        let played = match play::run_quiz(&mut self.input, setup, questions, &mut self.rng, bell).await {
            Ok(played) => played,
            Err(AppError::EmptySelection(msg)) => {
                println!("No questions available: {}", msg);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let Some((session, result)) = played else {
            println!("Quiz abandoned. Nothing was saved.");
            return Ok(None);
        };

        self.save_result(user, &session, &result).await;
        Ok(Some(result))
    }

    /// Persists a finished attempt. Failures are reported; the result shown
    /// to the learner stays as computed.
    async fn save_result(&self, user: &User, session: &QuizSession, result: &ScoreResult) {
        let record = NewQuizRecord::from_result(&user.username, session, result);
        if let Err(e) = self.state.history().record(&record).await {
            tracing::warn!("Could not save quiz result: {}", e);
            println!("Your result could not be saved: {}", e);
            return;
        }

        let today = Local::now().date_naive();
        match settings::update_streak(&self.state.pool, &user.username, today).await {
            Ok(streak) => println!("Day streak: {}", streak),
            Err(e) => tracing::warn!("Could not update streak: {}", e),
        }

        match achievements::check_and_unlock(&self.state.pool, &user.username).await {
            Ok(unlocked) => {
                for a in unlocked {
                    println!("Achievement unlocked: {} {} - {}", a.icon, a.name, a.description);
                }
            }
            Err(e) => tracing::warn!("Could not evaluate achievements: {}", e),
        }
    }

    async fn show_history(&mut self, user: &User) -> Result<(), AppError> {
        let recent = self.state.history().recent_attempts(&user.username, 20).await?;
        if recent.is_empty() {
            println!("No quizzes played yet.");
            return Ok(());
        }

        println!("\n{:<17} {:<15} {:<7} {:<9} {:>6} {:>7}", "Played", "Category", "Level", "Mode", "Score", "%");
        for r in recent {
            println!(
                "{:<17} {:<15} {:<7} {:<9} {:>6} {:>6.1}%",
                r.played_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                r.category,
                r.difficulty,
                r.mode,
                r.score,
                r.percentage
            );
        }
        Ok(())
    }

    async fn show_leaderboard(&mut self) -> Result<(), AppError> {
        let entries = self.state.history().top_scores(LEADERBOARD_SIZE).await?;
        if entries.is_empty() {
            println!("The leaderboard is empty.");
            return Ok(());
        }

        println!("\n{:<4} {:<20} {:<15} {:<7} {:>6} {:>7}", "#", "Player", "Category", "Level", "Score", "%");
        for (rank, e) in entries.iter().enumerate() {
            println!(
                "{:<4} {:<20} {:<15} {:<7} {:>6} {:>6.1}%",
                rank + 1,
                e.username,
                e.category,
                e.difficulty,
                e.score,
                e.percentage
            );
        }
        Ok(())
    }

    async fn show_analytics(&mut self, user: &User) -> Result<(), AppError> {
        let history = self.state.history();
        let summary = history.user_stats_summary(&user.username).await?;
        if summary.total_quizzes == 0 {
            println!("Play a quiz first to see analytics.");
            return Ok(());
        }

        println!("\nQuizzes: {}", summary.total_quizzes);
        println!(
            "Average: {:.1} points, {:.1}%",
            summary.average_score, summary.average_percentage
        );
        println!("Best: {} points, {:.1}%", summary.best_score, summary.best_percentage);
        println!("Correct answers: {} / {}", summary.total_correct, summary.total_questions);
        if let Some(category) = &summary.most_attempted_category {
            println!("Favourite category: {}", category);
        }

        let records = history.user_history(&user.username).await?;
        let scores: Vec<f64> = records.iter().map(|r| r.score as f64).collect();
        let percentages: Vec<f64> = records.iter().map(|r| r.percentage).collect();
        let analysis = scoring::analyze_performance(&scores, &percentages);
        println!(
            "Trend: {} ({:+.2}/quiz), recent average {:.1}%, consistency {:.1}",
            analysis.improvement.trend.as_str(),
            analysis.improvement.slope,
            analysis.recent_average,
            analysis.consistency_score
        );

        let all_scores: Vec<f64> = history
            .top_scores(i64::MAX)
            .await?
            .iter()
            .map(|e| e.score as f64)
            .collect();
        println!(
            "Your best score beats or matches {:.0}% of all attempts",
            scoring::percentile(summary.best_score as f64, &all_scores)
        );

        println!("\nBy mode:");
        for m in history.performance_by_mode(&user.username).await? {
            println!(
                "  {:<9} {:>3} played, {:>5.1}% avg, {:>6.1} points avg",
                m.mode, m.attempts, m.average_percentage, m.average_score
            );
        }

        println!("By difficulty:");
        for d in history.difficulty_statistics(Some(&user.username)).await? {
            println!(
                "  {:<9} {:>3} played, {:>5.1}% avg, {}/{} correct",
                d.difficulty, d.attempts, d.average_percentage, d.correct, d.total_questions
            );
        }

        println!("By category:");
        for c in history.category_statistics(Some(&user.username)).await? {
            println!("  {:<15} {:>5.1}%", c.category, c.average_percentage);
        }
        Ok(())
    }

    async fn show_achievements(&mut self, user: &User) -> Result<(), AppError> {
        let overview = achievements::overview(&self.state.pool, &user.username).await?;
        println!("\nAchievements {}/{}", overview.unlocked_count, overview.total);
        for a in &overview.unlocked {
            println!("  {} {} - {}", a.icon, a.name, a.description);
        }
        for a in &overview.locked {
            println!("  [locked] {} - {}", a.name, a.description);
        }
        Ok(())
    }

    async fn edit_settings(&mut self, user: &User) -> Result<(), AppError> {
        let current = settings::get(&self.state.pool, &user.username).await?;
        let choices = [
            format!("Sound: {}", if current.sound_enabled { "on" } else { "off" }),
            format!("Theme: {}", current.theme),
            "Back".to_string(),
        ];

        let Some(choice) = self.input.choose("Settings", &choices, |c| c.clone()).await? else {
            return Ok(());
        };

        if choice.starts_with("Sound") {
            settings::set_sound_enabled(&self.state.pool, &user.username, !current.sound_enabled)
                .await?;
        } else if choice.starts_with("Theme") {
            let next = if current.theme == "light" { "dark" } else { "light" };
            settings::set_theme(&self.state.pool, &user.username, next).await?;
        }
        Ok(())
    }

    async fn export(&mut self, user: &User) -> Result<(), AppError> {
        let path = format!("{}_history.json", user.username);
        if self.state.history().export_user_history(&user.username, &path).await? {
            println!("History written to {}", path);
        } else {
            println!("Nothing to export yet.");
        }
        Ok(())
    }
}
