//! Run-level counters reported after reconciliation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MergedEntity, RejectReason, Rejection, SourceId};

/// Outcome counts for one run.
///
/// `ingested == skipped + merged + entities` always holds: every ingested
/// record was either rejected, became an entity, or was absorbed into one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Raw records read.
    pub ingested: usize,
    /// Rejected records per reason.
    pub skipped: BTreeMap<RejectReason, usize>,
    /// Canonical records left without coordinates.
    pub unresolved: usize,
    /// Records absorbed into another record's entity.
    pub merged: usize,
    /// Entities emitted.
    pub entities: usize,
    /// Entities flagged for manual review.
    pub flagged: usize,
    /// Canonical records per source.
    pub by_source: BTreeMap<SourceId, usize>,
    /// Entities combining listings from more than one source.
    pub multi_source: usize,
}

impl RunSummary {
    /// Tally a finished run.
    #[must_use]
    pub fn from_run(ingested: usize, rejections: &[Rejection], entities: &[MergedEntity]) -> Self {
        let mut summary = Self {
            ingested,
            entities: entities.len(),
            ..Self::default()
        };
        for rejection in rejections {
            *summary.skipped.entry(rejection.reason).or_default() += 1;
        }
        for entity in entities {
            summary.merged += entity.members.len().saturating_sub(1);
            if entity.needs_review() {
                summary.flagged += 1;
            }
            if entity.sources().len() > 1 {
                summary.multi_source += 1;
            }
            for member in &entity.members {
                *summary.by_source.entry(member.source()).or_default() += 1;
                if member.location.is_none() {
                    summary.unresolved += 1;
                }
            }
        }
        summary
    }

    /// Total rejected records.
    #[must_use]
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ingested:     {}", self.ingested)?;
        writeln!(f, "skipped:      {}", self.skipped_total())?;
        for (reason, count) in &self.skipped {
            writeln!(f, "  {reason}: {count}")?;
        }
        writeln!(f, "unresolved:   {}", self.unresolved)?;
        writeln!(f, "merged:       {}", self.merged)?;
        writeln!(f, "entities:     {}", self.entities)?;
        writeln!(f, "flagged:      {}", self.flagged)?;
        writeln!(f, "multi-source: {}", self.multi_source)?;
        for (source, count) in &self.by_source {
            writeln!(f, "  {source}: {count}")?;
        }
        Ok(())
    }
}
