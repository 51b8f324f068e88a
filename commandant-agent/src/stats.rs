//! Per-episode statistics log

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commandant_core::AtomicAction;

/// Everything the controller counted over one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Episode number, starting at zero
    pub episode: u64,
    /// Exploration rate in force during the episode
    pub epsilon: f64,
    /// Ticks observed, decision and execution alike
    pub total_steps: u64,
    /// Sum of the scaled game clock over decision ticks
    pub total_game_time: u64,
    /// Issued commands per atomic action, indexed by [`AtomicAction::index`]
    pub executed: Vec<u64>,
    /// Actions whose preconditions failed
    pub failed_actions: u64,
    /// Decisions taken by exploration
    pub count_exploration: u64,
    /// Decisions taken by exploitation
    pub count_exploitation: u64,
    /// Sum of per-step rewards over the trajectory
    pub total_reward: f64,
    /// Terminal reward of the episode
    pub final_reward: f64,
    /// Wall-clock start of the episode
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the episode
    pub finished_at: DateTime<Utc>,
}

impl EpisodeStats {
    /// Episode wall-clock duration in seconds
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        let delta = self.finished_at - self.started_at;
        #[allow(clippy::cast_precision_loss)]
        let millis = delta.num_milliseconds() as f64;
        millis / 1000.0
    }

    fn header() -> String {
        let mut header = String::from("episode,epsilon,total_steps,total_game_time");
        for action in AtomicAction::ALL {
            let _ = write!(header, ",{action}");
        }
        header.push_str(
            ",failed_actions,count_exploration,count_exploitation,\
             total_reward,final_reward,started_at,finished_at,duration_secs",
        );
        header
    }

    fn to_row(&self) -> String {
        let mut row = format!(
            "{},{},{},{}",
            self.episode, self.epsilon, self.total_steps, self.total_game_time
        );
        for action in AtomicAction::ALL {
            let count = self.executed.get(action.index()).copied().unwrap_or(0);
            let _ = write!(row, ",{count}");
        }
        let _ = write!(
            row,
            ",{},{},{},{},{},{},{},{}",
            self.failed_actions,
            self.count_exploration,
            self.count_exploitation,
            self.total_reward,
            self.final_reward,
            self.started_at.to_rfc3339(),
            self.finished_at.to_rfc3339(),
            self.duration_secs()
        );
        row
    }
}

/// Append-only writer for the episode statistics file
///
/// One row per finished episode; the header is written when the file is
/// created. Stats are best-effort: a write failure is logged and the episode
/// loop continues.
#[derive(Debug, Clone)]
pub struct StatsWriter {
    path: PathBuf,
}

impl StatsWriter {
    /// Create a writer targeting `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the statistics file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one episode row, creating the file and header on first use
    ///
    /// # Errors
    ///
    /// IO errors from opening or writing the file.
    pub fn append(&self, stats: &EpisodeStats) -> std::io::Result<()> {
        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if fresh {
            writeln!(file, "{}", EpisodeStats::header())?;
        }
        writeln!(file, "{}", stats.to_row())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(episode: u64) -> EpisodeStats {
        let started_at = Utc::now();
        EpisodeStats {
            episode,
            epsilon: 0.5,
            total_steps: 120,
            total_game_time: 90,
            executed: vec![4; AtomicAction::ALL.len()],
            failed_actions: 2,
            count_exploration: 7,
            count_exploitation: 3,
            total_reward: 12.5,
            final_reward: 100.0,
            started_at,
            finished_at: started_at + chrono::Duration::milliseconds(1500),
        }
    }

    #[test]
    fn duration_comes_from_timestamps() {
        assert!((sample(0).duration_secs() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StatsWriter::new(dir.path().join("stats.csv"));

        writer.append(&sample(0)).unwrap();
        writer.append(&sample(1)).unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("episode,epsilon,"));
        assert!(lines[0].contains(",train_marine,"));
        assert!(lines[1].starts_with("0,0.5,120,90,"));
        assert!(lines[2].starts_with("1,"));
    }
}
