// src/quiz/scoring.rs

//! Pure scoring functions. Nothing here keeps state between calls.

use serde::Serialize;

use crate::models::question::Difficulty;

/// Answers at or under this many seconds earn the fast bonus.
pub const TIME_BONUS_FAST_SECS: f64 = 10.0;
pub const TIME_BONUS_MODERATE_SECS: f64 = 20.0;
pub const BONUS_POINTS_FAST: u32 = 5;
pub const BONUS_POINTS_MODERATE: u32 = 3;

/// Survival runs with at least this many correct answers get the multiplier.
pub const SURVIVAL_COMBO_THRESHOLD: u32 = 5;

/// Slope magnitude (percentage points per attempt) that counts as a trend.
pub const TREND_THRESHOLD: f64 = 0.5;

/// Returns 0.0 for an empty quiz instead of dividing by zero.
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * correct as f64 / total as f64
}

pub fn base_score(correct: u32, difficulty: Difficulty) -> u32 {
    correct * difficulty.points()
}

pub fn time_bonus(elapsed_secs: f64) -> u32 {
    if elapsed_secs <= TIME_BONUS_FAST_SECS {
        BONUS_POINTS_FAST
    } else if elapsed_secs <= TIME_BONUS_MODERATE_SECS {
        BONUS_POINTS_MODERATE
    } else {
        0
    }
}

/// Base score plus a time bonus for each correct answer's response time.
pub fn timed_score(correct: u32, difficulty: Difficulty, answer_times: &[f64]) -> u32 {
    let bonus: u32 = answer_times.iter().map(|&t| time_bonus(t)).sum();
    base_score(correct, difficulty) + bonus
}

/// Base score, times 1.5 (floored) once the run reaches the combo threshold.
pub fn survival_score(correct: u32, difficulty: Difficulty) -> u32 {
    let base = base_score(correct, difficulty);
    if correct >= SURVIVAL_COMBO_THRESHOLD {
        base * 3 / 2
    } else {
        base
    }
}

/// Score for a quiz that mixed difficulties.
pub fn weighted_score(easy_correct: u32, medium_correct: u32, hard_correct: u32) -> u32 {
    base_score(easy_correct, Difficulty::Easy)
        + base_score(medium_correct, Difficulty::Medium)
        + base_score(hard_correct, Difficulty::Hard)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Average => "Average",
            Grade::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Colour tag for whatever renders the result. Opaque to the core.
    pub fn color(self) -> &'static str {
        match self {
            Grade::Excellent => "#28a745",
            Grade::Good => "#007bff",
            Grade::Average => "#ffc107",
            Grade::NeedsImprovement => "#dc3545",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Grade::Excellent => "Outstanding performance!",
            Grade::Good => "Well done!",
            Grade::Average => "Keep practicing!",
            Grade::NeedsImprovement => "More practice recommended",
        }
    }
}

pub fn grade_info(percentage: f64) -> Grade {
    if percentage >= 90.0 {
        Grade::Excellent
    } else if percentage >= 70.0 {
        Grade::Good
    } else if percentage >= 50.0 {
        Grade::Average
    } else {
        Grade::NeedsImprovement
    }
}

/// Mode-specific detail attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ModeBonus {
    None,
    TimeBonus { total: u32 },
    SurvivalMultiplier { applied: bool },
}

/// Final numbers for one quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Questions actually presented, which is fewer than selected when a
    /// Survival run ends early.
    pub total_questions: u32,
    pub correct: u32,
    pub wrong: u32,
    pub score: u32,
    pub percentage: f64,
    pub grade: Grade,
    pub elapsed_secs: f64,
    pub bonus: ModeBonus,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Summary statistics with population standard deviation.
/// Empty input yields all zeros.
pub fn statistics(values: &[f64]) -> Statistics {
    if values.is_empty() {
        return Statistics::default();
    }

    let count = values.len();
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    Statistics {
        mean,
        median,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[count - 1],
        count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Improvement {
    pub slope: f64,
    pub trend: Trend,
}

/// Least-squares slope of `values` against their position 0..n-1.
pub fn improvement_rate(values: &[f64]) -> Improvement {
    if values.len() < 2 {
        return Improvement {
            slope: 0.0,
            trend: Trend::InsufficientData,
        };
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let (mut covariance, mut variance_x) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        covariance += dx * (y - mean_y);
        variance_x += dx * dx;
    }
    let slope = covariance / variance_x;

    let trend = if slope > TREND_THRESHOLD {
        Trend::Improving
    } else if slope < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    };

    Improvement { slope, trend }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DifficultyAccuracy {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

/// Each argument is `(correct, total)` for one difficulty.
pub fn accuracy_by_difficulty(
    easy: (u32, u32),
    medium: (u32, u32),
    hard: (u32, u32),
) -> DifficultyAccuracy {
    DifficultyAccuracy {
        easy: percentage(easy.0, easy.1),
        medium: percentage(medium.0, medium.1),
        hard: percentage(hard.0, hard.1),
    }
}

/// Share of `all_scores` at or below `score`, in percent.
pub fn percentile(score: f64, all_scores: &[f64]) -> f64 {
    if all_scores.is_empty() {
        return 0.0;
    }
    let at_or_below = all_scores.iter().filter(|&&s| s <= score).count();
    100.0 * at_or_below as f64 / all_scores.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceAnalysis {
    pub statistics: Statistics,
    pub improvement: Improvement,
    pub recent_average: f64,
    pub consistency_score: f64,
    pub total_attempts: usize,
}

/// Combines statistics and trend over a user's percentages.
pub fn analyze_performance(scores: &[f64], percentages: &[f64]) -> PerformanceAnalysis {
    let stats = statistics(percentages);
    let improvement = improvement_rate(percentages);

    let (recent_average, consistency_score) = if percentages.is_empty() {
        (0.0, 0.0)
    } else {
        let recent = if percentages.len() >= 5 {
            statistics(&percentages[percentages.len() - 5..]).mean
        } else {
            stats.mean
        };
        // Lower spread means steadier results.
        (recent, (100.0 - stats.std_dev).max(0.0))
    };

    PerformanceAnalysis {
        statistics: stats,
        improvement,
        recent_average,
        consistency_score,
        total_attempts: scores.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(7, 10), 70.0);
        assert_eq!(percentage(10, 10), 100.0);
    }

    #[test]
    fn test_base_score_per_difficulty() {
        for c in [0, 1, 7, 40] {
            for d in Difficulty::ALL {
                assert_eq!(base_score(c, d), c * d.points());
            }
        }
        assert_eq!(base_score(3, Difficulty::Hard), 75);
    }

    #[test]
    fn test_time_bonus_boundaries() {
        assert_eq!(time_bonus(0.0), 5);
        assert_eq!(time_bonus(10.0), 5);
        assert_eq!(time_bonus(10.0001), 3);
        assert_eq!(time_bonus(20.0), 3);
        assert_eq!(time_bonus(20.01), 0);
    }

    #[test]
    fn test_timed_and_survival_scores() {
        assert_eq!(timed_score(3, Difficulty::Easy, &[9.5, 15.0, 25.0]), 30 + 8);
        assert_eq!(survival_score(4, Difficulty::Medium), 60);
        assert_eq!(survival_score(5, Difficulty::Medium), 112);
        assert_eq!(weighted_score(1, 1, 1), 50);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade_info(100.0), Grade::Excellent);
        assert_eq!(grade_info(90.0), Grade::Excellent);
        assert_eq!(grade_info(89.9), Grade::Good);
        assert_eq!(grade_info(70.0), Grade::Good);
        assert_eq!(grade_info(50.0), Grade::Average);
        assert_eq!(grade_info(49.99), Grade::NeedsImprovement);
        assert_eq!(Grade::NeedsImprovement.label(), "Needs Improvement");
    }

    #[test]
    fn test_statistics_population_std_dev() {
        let stats = statistics(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.median, 4.5));
        assert!(approx(stats.std_dev, 2.0));
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.count, 8);
    }

    #[test]
    fn test_statistics_empty_and_idempotent() {
        assert_eq!(statistics(&[]), Statistics::default());

        let values = [70.0, 55.0, 90.0];
        assert_eq!(statistics(&values), statistics(&values));
        assert_eq!(statistics(&values).median, 70.0);
    }

    #[test]
    fn test_improvement_rate() {
        assert_eq!(improvement_rate(&[80.0]).trend, Trend::InsufficientData);
        assert_eq!(improvement_rate(&[]).slope, 0.0);

        let rising = improvement_rate(&[50.0, 60.0, 70.0]);
        assert!(approx(rising.slope, 10.0));
        assert_eq!(rising.trend, Trend::Improving);

        assert_eq!(improvement_rate(&[90.0, 80.0, 70.0]).trend, Trend::Declining);
        assert_eq!(improvement_rate(&[70.0, 70.4, 70.0]).trend, Trend::Stable);
    }

    #[test]
    fn test_accuracy_and_percentile() {
        let acc = accuracy_by_difficulty((3, 4), (0, 0), (1, 2));
        assert_eq!(acc.easy, 75.0);
        assert_eq!(acc.medium, 0.0);
        assert_eq!(acc.hard, 50.0);

        assert_eq!(percentile(50.0, &[]), 0.0);
        assert_eq!(percentile(50.0, &[10.0, 50.0, 60.0, 90.0]), 50.0);
    }

    #[test]
    fn test_analyze_performance_uses_last_five() {
        let percentages = [0.0, 100.0, 100.0, 100.0, 100.0, 100.0];
        let analysis = analyze_performance(&[10.0; 6], &percentages);
        assert_eq!(analysis.recent_average, 100.0);
        assert_eq!(analysis.total_attempts, 6);
        assert!(analysis.consistency_score < 100.0);

        let empty = analyze_performance(&[], &[]);
        assert_eq!(empty.recent_average, 0.0);
        assert_eq!(empty.consistency_score, 0.0);
    }
}
