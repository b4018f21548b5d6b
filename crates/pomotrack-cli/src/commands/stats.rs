use chrono::NaiveDate;
use clap::Subcommand;
use pomotrack_core::{SessionStore, StatsAggregator};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's rollup
    Today,
    /// Rollup for one calendar day
    Day {
        /// Date in YYYY-MM-DD
        date: NaiveDate,
    },
    /// This week so far (Sunday through today)
    Week,
    /// This month so far
    Month,
    /// Inclusive date range
    Range {
        /// Start date in YYYY-MM-DD
        start: NaiveDate,
        /// End date in YYYY-MM-DD
        end: NaiveDate,
    },
    /// Current daily streak of completed sessions
    Streak,
    /// Total completed minutes across the whole log
    Total,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open()?;
    let stats = StatsAggregator::new(store.sessions());

    match action {
        StatsAction::Today => {
            let today = chrono::Local::now().date_naive();
            println!("{}", serde_json::to_string_pretty(&stats.day_stats(today))?);
        }
        StatsAction::Day { date } => {
            println!("{}", serde_json::to_string_pretty(&stats.day_stats(date))?);
        }
        StatsAction::Week => {
            println!("{}", serde_json::to_string_pretty(&stats.week_stats())?);
        }
        StatsAction::Month => {
            println!("{}", serde_json::to_string_pretty(&stats.month_stats())?);
        }
        StatsAction::Range { start, end } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats.stats_by_range(start, end))?
            );
        }
        StatsAction::Streak => {
            println!("{}", stats.current_streak());
        }
        StatsAction::Total => {
            println!("{}", stats.total_minutes());
        }
    }
    Ok(())
}
