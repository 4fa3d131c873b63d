//! Run accounting and the final summary.

use crate::config::{Side, SyncDirection};
use crate::executor::ActionOutcome;
use std::fmt;
use std::time::Duration;

/// Writes into one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    /// Records created.
    pub created: u64,
    /// Records overwritten.
    pub updated: u64,
}

/// Outcome counters for one model or a whole run.
///
/// Each recorded outcome bumps exactly one of `created`, `updated`,
/// `skipped` or `errors`. The per-side counts break `created` and `updated`
/// down by destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records created on either side.
    pub created: u64,
    /// Records overwritten on either side.
    pub updated: u64,
    /// Records left alone because both sides agreed on the timestamp.
    pub skipped: u64,
    /// Records whose write failed.
    pub errors: u64,
    /// Writes into the source.
    pub into_source: WriteCounts,
    /// Writes into the target.
    pub into_target: WriteCounts,
}

impl SyncStats {
    /// Counts one action outcome.
    pub fn record(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Created(side) => {
                self.created += 1;
                self.side_mut(side).created += 1;
            }
            ActionOutcome::Updated(side) => {
                self.updated += 1;
                self.side_mut(side).updated += 1;
            }
            ActionOutcome::Skipped => self.skipped += 1,
            ActionOutcome::Failed => self.errors += 1,
        }
    }

    /// Adds another set of counters into this one.
    pub fn merge(&mut self, other: &SyncStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
        for side in [Side::Source, Side::Target] {
            let theirs = *other.side(side);
            let ours = self.side_mut(side);
            ours.created += theirs.created;
            ours.updated += theirs.updated;
        }
    }

    /// Writes into one side.
    pub fn side(&self, side: Side) -> &WriteCounts {
        match side {
            Side::Source => &self.into_source,
            Side::Target => &self.into_target,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut WriteCounts {
        match side {
            Side::Source => &mut self.into_source,
            Side::Target => &mut self.into_target,
        }
    }

    /// Number of outcomes recorded.
    pub fn attempted(&self) -> u64 {
        self.created + self.updated + self.skipped + self.errors
    }

    /// Number of successful writes.
    pub fn written(&self) -> u64 {
        self.created + self.updated
    }
}

impl FromIterator<ActionOutcome> for SyncStats {
    fn from_iter<I: IntoIterator<Item = ActionOutcome>>(outcomes: I) -> Self {
        let mut stats = SyncStats::default();
        for outcome in outcomes {
            stats.record(outcome);
        }
        stats
    }
}

/// How one model went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReport {
    /// Model name.
    pub model: String,
    /// Records read from the source.
    pub source_records: usize,
    /// Records read from the target.
    pub target_records: usize,
    /// Outcome counters.
    pub stats: SyncStats,
}

/// A model that was not processed because a snapshot could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModel {
    /// Model name.
    pub model: String,
    /// Side whose read failed.
    pub side: Side,
    /// The read error.
    pub reason: String,
}

/// Collects per-model results while a run is in progress.
#[derive(Debug)]
pub struct StatsAggregator {
    direction: SyncDirection,
    dry_run: bool,
    models: Vec<ModelReport>,
    skipped_models: Vec<SkippedModel>,
    totals: SyncStats,
}

impl StatsAggregator {
    /// Starts an empty aggregation.
    pub fn new(direction: SyncDirection, dry_run: bool) -> Self {
        Self {
            direction,
            dry_run,
            models: Vec::new(),
            skipped_models: Vec::new(),
            totals: SyncStats::default(),
        }
    }

    /// Adds a processed model.
    pub fn record_model(&mut self, report: ModelReport) {
        self.totals.merge(&report.stats);
        self.models.push(report);
    }

    /// Adds a model that was skipped.
    pub fn skip_model(&mut self, skipped: SkippedModel) {
        self.skipped_models.push(skipped);
    }

    /// Running totals.
    pub fn totals(&self) -> &SyncStats {
        &self.totals
    }

    /// Finishes the run.
    pub fn finish(self, duration: Duration) -> RunReport {
        RunReport {
            direction: self.direction,
            dry_run: self.dry_run,
            models: self.models,
            skipped_models: self.skipped_models,
            totals: self.totals,
            duration,
        }
    }
}

/// The result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Direction of the run.
    pub direction: SyncDirection,
    /// Whether writes were simulated.
    pub dry_run: bool,
    /// Processed models, in order.
    pub models: Vec<ModelReport>,
    /// Models skipped after a read failure.
    pub skipped_models: Vec<SkippedModel>,
    /// Totals across processed models.
    pub totals: SyncStats,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl RunReport {
    /// Returns true if any record failed or any model was skipped.
    pub fn has_failures(&self) -> bool {
        self.totals.errors > 0 || !self.skipped_models.is_empty()
    }

    /// Looks up one model's report.
    pub fn model(&self, name: &str) -> Option<&ModelReport> {
        self.models.iter().find(|report| report.model == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        let title = if self.dry_run {
            "Sync summary (DRY RUN - nothing was written)"
        } else {
            "Sync summary"
        };
        let verb = if self.dry_run { "would be: " } else { "" };
        let totals = &self.totals;

        writeln!(f, "{rule}")?;
        writeln!(f, "{title}")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "  Mode:      {} ({})",
            self.direction,
            self.direction.describe()
        )?;
        writeln!(
            f,
            "  Created:   {} ({verb}source {}, target {})",
            totals.created, totals.into_source.created, totals.into_target.created
        )?;
        writeln!(
            f,
            "  Updated:   {} ({verb}source {}, target {})",
            totals.updated, totals.into_source.updated, totals.into_target.updated
        )?;
        writeln!(f, "  Skipped:   {}", totals.skipped)?;
        writeln!(f, "  Errors:    {}", totals.errors)?;
        writeln!(
            f,
            "  Models:    {} synced, {} skipped",
            self.models.len(),
            self.skipped_models.len()
        )?;
        for skipped in &self.skipped_models {
            writeln!(
                f,
                "             - {} ({} read failed: {})",
                skipped.model, skipped.side, skipped.reason
            )?;
        }
        write!(f, "  Duration:  {:.2}s", self.duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_report(name: &str, outcomes: &[ActionOutcome]) -> ModelReport {
        ModelReport {
            model: name.into(),
            source_records: outcomes.len(),
            target_records: 0,
            stats: outcomes.iter().copied().collect(),
        }
    }

    #[test]
    fn each_outcome_bumps_one_counter() {
        let outcomes = [
            ActionOutcome::Created(Side::Target),
            ActionOutcome::Created(Side::Source),
            ActionOutcome::Updated(Side::Target),
            ActionOutcome::Skipped,
            ActionOutcome::Failed,
        ];
        let stats: SyncStats = outcomes.iter().copied().collect();

        assert_eq!(stats.created, 2);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.attempted(), outcomes.len() as u64);
        assert_eq!(stats.written(), 3);
        assert_eq!(stats.into_target, WriteCounts { created: 1, updated: 1 });
        assert_eq!(stats.into_source, WriteCounts { created: 1, updated: 0 });
    }

    #[test]
    fn merge_adds_everything() {
        let mut a: SyncStats = [ActionOutcome::Created(Side::Target)].into_iter().collect();
        let b: SyncStats = [ActionOutcome::Updated(Side::Source), ActionOutcome::Failed]
            .into_iter()
            .collect();
        a.merge(&b);

        assert_eq!(a.attempted(), 3);
        assert_eq!(a.side(Side::Source).updated, 1);
        assert_eq!(a.side(Side::Target).created, 1);
        assert_eq!(a.errors, 1);
    }

    #[test]
    fn aggregator_totals_models() {
        let mut aggregator = StatsAggregator::new(SyncDirection::BidirectionalMerge, false);
        aggregator.record_model(model_report("user", &[ActionOutcome::Created(Side::Target)]));
        aggregator.record_model(model_report("asset", &[]));
        aggregator.skip_model(SkippedModel {
            model: "ticket".into(),
            side: Side::Source,
            reason: "unknown model: ticket".into(),
        });
        assert_eq!(aggregator.totals().created, 1);

        let report = aggregator.finish(Duration::from_millis(1500));
        assert_eq!(report.models.len(), 2);
        assert_eq!(report.model("asset").unwrap().stats, SyncStats::default());
        assert!(report.has_failures());
    }

    #[test]
    fn summary_distinguishes_dry_run() {
        let live = StatsAggregator::new(SyncDirection::PushToTarget, false)
            .finish(Duration::from_millis(250))
            .to_string();
        assert!(live.contains("Sync summary"));
        assert!(!live.contains("DRY RUN"));
        assert!(live.contains("neon-to-local"));
        assert!(live.contains("Duration:  0.25s"));

        let dry = StatsAggregator::new(SyncDirection::PushToTarget, true)
            .finish(Duration::ZERO)
            .to_string();
        assert!(dry.contains("DRY RUN"));
        assert!(dry.contains("Created:   0 (would be: source 0, target 0)"));
        assert!(dry.contains("Updated:   0 (would be: source 0, target 0)"));
    }

    #[test]
    fn summary_lists_counts_and_skips() {
        let mut aggregator = StatsAggregator::new(SyncDirection::BidirectionalMerge, false);
        aggregator.record_model(model_report(
            "user",
            &[
                ActionOutcome::Updated(Side::Target),
                ActionOutcome::Skipped,
                ActionOutcome::Failed,
            ],
        ));
        aggregator.skip_model(SkippedModel {
            model: "comment".into(),
            side: Side::Target,
            reason: "unknown model: comment".into(),
        });
        let text = aggregator.finish(Duration::from_secs(2)).to_string();

        assert!(text.contains("Updated:   1 (source 0, target 1)"));
        assert!(text.contains("Skipped:   1"));
        assert!(text.contains("Errors:    1"));
        assert!(text.contains("1 synced, 1 skipped"));
        assert!(text.contains("comment (target read failed"));
    }
}
