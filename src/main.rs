// src/main.rs

use dotenvy::dotenv;
use quiz_core::config::Config;
use quiz_core::error::AppError;
use quiz_core::quiz::QuestionBank;
use quiz_core::shell::Shell;
use quiz_core::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // stderr keeps log lines out of the quiz prompts on stdout
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    let state = AppState::connect(config.clone()).await?;

    let bank = QuestionBank::load_json(&config.question_bank_path)?;
    if bank.is_empty() {
        tracing::warn!("Question bank {} has no usable questions", config.question_bank_path);
    }

    Shell::new(state, bank).run().await
}
