use std::collections::HashMap;

use tracing::debug;

use super::models::{Job, Stage};
use crate::errors::{BoardError, BoardResult};

/// Stage id → ordered job ids, in column order.
///
/// Order within a bucket is display order only; the server persists stage
/// membership, not position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageBuckets {
    columns: Vec<i64>,
    buckets: HashMap<i64, Vec<i64>>,
}

impl StageBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch. Every stage gets a bucket, empty or not.
    /// Jobs whose stage is not among `stages` are left out of every bucket.
    ///
    /// A repeated stage id keeps only its first column.
    ///
    /// Returns the number of jobs skipped that way.
    pub fn rebuild(&mut self, stages: &[Stage], jobs: &[Job]) -> usize {
        self.columns.clear();
        self.buckets.clear();
        for stage in stages {
            if self.buckets.insert(stage.id, Vec::new()).is_none() {
                self.columns.push(stage.id);
            }
        }

        let mut skipped = 0;
        for job in jobs {
            match self.buckets.get_mut(&job.current_stage_id) {
                Some(bucket) => bucket.push(job.id),
                None => {
                    skipped += 1;
                    let reason = BoardError::InconsistentStageReference {
                        job_id: job.id,
                        stage_id: job.current_stage_id,
                    };
                    debug!(%reason, "Skipping job");
                }
            }
        }
        skipped
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.buckets.clear();
    }

    /// Move `job_id` out of `from` and into `to` at `to_index`, clamped to
    /// the destination length. When `from == to` this is a reorder and the
    /// index refers to the column after removal.
    ///
    /// Returns the index the job was removed from. Nothing is mutated on error.
    pub fn move_local(
        &mut self,
        job_id: i64,
        from: i64,
        to: i64,
        to_index: usize,
    ) -> BoardResult<usize> {
        if !self.buckets.contains_key(&to) {
            return Err(BoardError::UnknownStage { stage_id: to });
        }
        let source = self
            .buckets
            .get_mut(&from)
            .ok_or(BoardError::UnknownStage { stage_id: from })?;
        let from_index = source
            .iter()
            .position(|id| *id == job_id)
            .ok_or(BoardError::JobNotInStage {
                job_id,
                stage_id: from,
            })?;
        source.remove(from_index);

        let dest = self
            .buckets
            .get_mut(&to)
            .ok_or(BoardError::UnknownStage { stage_id: to })?;
        let at = to_index.min(dest.len());
        dest.insert(at, job_id);

        debug!(job_id, from, to, from_index, to_index = at, "Local move");
        Ok(from_index)
    }

    pub fn bucket(&self, stage_id: i64) -> Option<&[i64]> {
        self.buckets.get(&stage_id).map(Vec::as_slice)
    }

    /// Buckets in column order.
    pub fn columns(&self) -> impl Iterator<Item = (i64, &[i64])> + '_ {
        self.columns
            .iter()
            .map(|id| (*id, self.bucket(*id).unwrap_or_default()))
    }

    pub fn stage_ids(&self) -> &[i64] {
        &self.columns
    }

    pub fn has_stage(&self, stage_id: i64) -> bool {
        self.buckets.contains_key(&stage_id)
    }

    /// Stage and index currently holding `job_id`.
    pub fn position(&self, job_id: i64) -> Option<(i64, usize)> {
        self.columns.iter().find_map(|stage_id| {
            self.buckets
                .get(stage_id)?
                .iter()
                .position(|id| *id == job_id)
                .map(|index| (*stage_id, index))
        })
    }

    pub fn job_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
