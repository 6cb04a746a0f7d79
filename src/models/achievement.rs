// src/models/achievement.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Aggregate numbers achievements are judged against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AchievementStats {
    pub total_quizzes: usize,
    pub best_percentage: f64,
    pub average_percentage: f64,
    pub streak_count: i64,
    pub timed_quizzes: usize,
    pub survival_quizzes: usize,
    pub hard_quizzes: usize,
    pub total_correct: i64,
}

/// A catalogue entry. `condition` decides whether the stats earn it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    #[serde(skip)]
    pub condition: fn(&AchievementStats) -> bool,
}

pub static ACHIEVEMENTS: [Achievement; 11] = [
    Achievement {
        id: "first_quiz",
        name: "Getting Started",
        description: "Complete your first quiz",
        icon: "🌟",
        condition: |s| s.total_quizzes >= 1,
    },
    Achievement {
        id: "quiz_master_10",
        name: "Quiz Master",
        description: "Complete 10 quizzes",
        icon: "🎓",
        condition: |s| s.total_quizzes >= 10,
    },
    Achievement {
        id: "quiz_legend_50",
        name: "Quiz Legend",
        description: "Complete 50 quizzes",
        icon: "👑",
        condition: |s| s.total_quizzes >= 50,
    },
    Achievement {
        id: "perfect_score",
        name: "Perfectionist",
        description: "Score 100% on any quiz",
        icon: "💯",
        condition: |s| s.best_percentage >= 100.0,
    },
    Achievement {
        id: "high_achiever",
        name: "High Achiever",
        description: "Maintain 90%+ average",
        icon: "⭐",
        condition: |s| s.total_quizzes > 0 && s.average_percentage >= 90.0,
    },
    Achievement {
        id: "streak_5",
        name: "5 Day Streak",
        description: "Play for 5 consecutive days",
        icon: "🔥",
        condition: |s| s.streak_count >= 5,
    },
    Achievement {
        id: "streak_30",
        name: "Dedication",
        description: "Play for 30 consecutive days",
        icon: "🌟",
        condition: |s| s.streak_count >= 30,
    },
    Achievement {
        id: "speed_demon",
        name: "Speed Demon",
        description: "Complete 10 Timed quizzes",
        icon: "⚡",
        condition: |s| s.timed_quizzes >= 10,
    },
    Achievement {
        id: "survivor",
        name: "Survivor",
        description: "Complete 10 Survival quizzes",
        icon: "💪",
        condition: |s| s.survival_quizzes >= 10,
    },
    Achievement {
        id: "knowledge_seeker",
        name: "Knowledge Seeker",
        description: "Answer 500 questions correctly",
        icon: "📚",
        condition: |s| s.total_correct >= 500,
    },
    Achievement {
        id: "hard_mode_master",
        name: "Hard Mode Master",
        description: "Complete 10 Hard difficulty quizzes",
        icon: "💎",
        condition: |s| s.hard_quizzes >= 10,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Catalogue entries the stats satisfy that are not in `already_unlocked`.
pub fn newly_satisfied(
    stats: &AchievementStats,
    already_unlocked: &[String],
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| (a.condition)(stats))
        .filter(|a| !already_unlocked.iter().any(|id| id == a.id))
        .collect()
}

/// Represents the 'achievements' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UnlockedAchievement {
    pub username: String,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Unlocked vs locked split for the profile screen.
#[derive(Debug, Serialize)]
pub struct AchievementOverview {
    pub unlocked: Vec<&'static Achievement>,
    pub locked: Vec<&'static Achievement>,
    pub total: usize,
    pub unlocked_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&Achievement]) -> Vec<&'static str> {
        list.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_fresh_user_earns_nothing() {
        assert!(newly_satisfied(&AchievementStats::default(), &[]).is_empty());
    }

    #[test]
    fn test_first_perfect_quiz() {
        let stats = AchievementStats {
            total_quizzes: 1,
            best_percentage: 100.0,
            average_percentage: 100.0,
            streak_count: 1,
            total_correct: 10,
            ..Default::default()
        };
        assert_eq!(
            ids(&newly_satisfied(&stats, &[])),
            vec!["first_quiz", "perfect_score", "high_achiever"]
        );
    }

    #[test]
    fn test_already_unlocked_are_skipped() {
        let stats = AchievementStats {
            total_quizzes: 12,
            timed_quizzes: 10,
            average_percentage: 40.0,
            best_percentage: 80.0,
            ..Default::default()
        };
        let unlocked = vec!["first_quiz".to_string()];
        assert_eq!(
            ids(&newly_satisfied(&stats, &unlocked)),
            vec!["quiz_master_10", "speed_demon"]
        );
    }

    #[test]
    fn test_find_by_id() {
        assert_eq!(find("survivor").map(|a| a.name), Some("Survivor"));
        assert!(find("nope").is_none());
    }
}
