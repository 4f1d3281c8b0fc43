use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use crate::brain::weekly::DEFAULT_PENDING_LIMIT;

#[derive(Parser, Debug)]
#[command(name = "habit-coach")]
#[command(about = "Rule-based coaching recommendations from habit tracking history")]
#[command(version)]
pub struct Cli {
    /// Dataset file (overrides the configured location)
    #[arg(long, global = true, env = "HABIT_COACH_DATA")]
    pub data: Option<PathBuf>,

    /// Configuration file (default: coach.toml in the app data directory)
    #[arg(long, global = true, env = "HABIT_COACH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluate trailing windows as of this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recommendations across all active habits of a user
    Recommend {
        #[arg(short, long)]
        user: i64,
    },

    /// Recommendations for a single habit
    Habit {
        #[arg(short, long)]
        user: i64,

        #[arg(long)]
        habit: i64,
    },

    /// Failure pattern report
    Failures {
        #[arg(short, long)]
        user: i64,

        /// Trailing window in days
        #[arg(long, default_value_t = 14)]
        days: i64,
    },

    /// Regenerate the stored recommendations for a completed week
    Weekly {
        #[arg(short, long)]
        user: i64,

        /// Monday of the week (YYYY-MM-DD)
        #[arg(short, long)]
        week: String,
    },

    /// Week stat and stored recommendations for a week
    Week {
        #[arg(short, long)]
        user: i64,

        /// Monday of the week (YYYY-MM-DD)
        #[arg(short, long)]
        week: String,
    },

    /// Stored recommendations not yet acted upon
    Pending {
        #[arg(short, long)]
        user: i64,

        #[arg(long, default_value_t = DEFAULT_PENDING_LIMIT)]
        limit: usize,
    },

    /// Mark a stored recommendation as acted upon
    Act {
        #[arg(short, long)]
        user: i64,

        /// Monday of the week (YYYY-MM-DD)
        #[arg(short, long)]
        week: String,

        #[arg(long)]
        habit: i64,

        /// Recommendation type (e.g. reduce_scope, schedule_adjustment)
        #[arg(long = "type")]
        recommendation_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "habit-coach",
            "weekly",
            "--user",
            "3",
            "--week",
            "2026-10-12",
            "--today",
            "2026-10-19",
        ])
        .unwrap();
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2026, 10, 19));
        match cli.command {
            Commands::Weekly { user, week } => {
                assert_eq!(user, 3);
                assert_eq!(week, "2026-10-12");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["habit-coach", "pending", "-u", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Pending { user: 1, limit: 10 }));

        let cli = Cli::try_parse_from(["habit-coach", "failures", "-u", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Failures { user: 1, days: 14 }));
    }

    #[test]
    fn test_act_requires_type() {
        assert!(Cli::try_parse_from(["habit-coach", "act", "-u", "1", "-w", "2026-10-12", "--habit", "2"]).is_err());
    }
}
