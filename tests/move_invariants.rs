//! Property tests for the drag-transfer controller: arbitrary drop
//! sequences with arbitrary outcomes resolved in arbitrary order.

mod common;

use common::*;
use proptest::prelude::*;
use workboard::board::transfer::MoveTicket;
use workboard::board::{
    DragTransferController, DropEvent, DropOutcome, JobDirectory, StageBuckets, Workflow,
};
use workboard::errors::BoardError;

const STAGES: [i64; 3] = [INTAKE, REVIEW, DONE];

struct Board {
    workflow: Workflow,
    buckets: StageBuckets,
    directory: JobDirectory,
    controller: DragTransferController,
    /// Issued tickets not yet completed, with their destination stage.
    outstanding: Vec<(MoveTicket, i64)>,
}

impl Board {
    fn new(job_count: i64) -> Self {
        let mut workflow = workflow();
        workflow.sort_stages();
        let jobs: Vec<_> = (1..=job_count)
            .map(|id| job(id, STAGES[(id as usize) % STAGES.len()]))
            .collect();
        let mut buckets = StageBuckets::new();
        buckets.rebuild(&workflow.stages, &jobs);
        let mut directory = JobDirectory::new();
        directory.load(WORKFLOW, jobs);
        Self {
            workflow,
            buckets,
            directory,
            controller: DragTransferController::new(),
            outstanding: Vec::new(),
        }
    }

    fn drop_job(&mut self, job_id: i64, dest_stage: i64, dest_index: usize) {
        let (source_stage, source_index) = self.buckets.position(job_id).unwrap();
        let event = DropEvent {
            job_id,
            source_stage,
            source_index,
            dest_stage,
            dest_index,
        };
        let outcome = self
            .controller
            .on_drop(
                &mut self.buckets,
                &mut self.directory,
                Some(&self.workflow),
                event,
            )
            .unwrap();
        if let DropOutcome::Applied(ticket) = outcome {
            self.outstanding.push((ticket, dest_stage));
        }
    }

    fn complete(&mut self, pick: usize, ok: bool) {
        if self.outstanding.is_empty() {
            return;
        }
        let (ticket, dest_stage) = self.outstanding.remove(pick % self.outstanding.len());
        let result = if ok {
            Ok(job(ticket.job_id, dest_stage))
        } else {
            Err(BoardError::StageUpdateRejected {
                job_id: ticket.job_id,
                stage_id: dest_stage,
                reason: "rejected".to_string(),
            })
        };
        self.controller
            .complete(&mut self.buckets, &mut self.directory, ticket, result);
    }

    fn assert_consistent(&self, job_count: i64) {
        let mut seen: Vec<i64> = self
            .buckets
            .columns()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        seen.sort();
        let expected: Vec<i64> = (1..=job_count).collect();
        assert_eq!(seen, expected, "every job in exactly one bucket");

        for job in self.directory.jobs() {
            let (stage_id, _) = self.buckets.position(job.id).unwrap();
            assert_eq!(stage_id, job.current_stage_id, "job {} placement", job.id);
        }
    }
}

proptest! {
    #[test]
    fn prop_moves_never_duplicate_or_lose_jobs(
        ops in proptest::collection::vec((any::<bool>(), 0..6i64, 0..3usize, 0..8usize, any::<bool>()), 0..60)
    ) {
        let job_count = 6;
        let mut board = Board::new(job_count);

        for (is_drop, job_pick, stage_pick, n, ok) in ops {
            if is_drop {
                board.drop_job(job_pick + 1, STAGES[stage_pick], n);
            } else {
                board.complete(n, ok);
            }
            board.assert_consistent(job_count);
        }

        while !board.outstanding.is_empty() {
            board.complete(0, false);
            board.assert_consistent(job_count);
        }
        prop_assert_eq!(board.controller.in_flight(), 0);
    }

    #[test]
    fn prop_rejected_moves_restore_the_original_board(
        drops in proptest::collection::vec((0..3usize, 0..5usize), 1..8),
        order in proptest::collection::vec(0..16usize, 8)
    ) {
        let mut board = Board::new(4);
        let job_id = 1;
        let before = board.buckets.clone();
        let original_stage = board.directory.get(job_id).unwrap().current_stage_id;

        for (stage_pick, index) in drops {
            // Same-column drops are local reorders and are never rolled back.
            let (current, _) = board.buckets.position(job_id).unwrap();
            if current != STAGES[stage_pick] {
                board.drop_job(job_id, STAGES[stage_pick], index);
            }
        }
        let mut step = 0;
        while !board.outstanding.is_empty() {
            board.complete(order[step % order.len()], false);
            step += 1;
        }

        prop_assert_eq!(&board.buckets, &before);
        let job = board.directory.get(job_id).unwrap();
        prop_assert_eq!(job.current_stage_id, original_stage);
        prop_assert_eq!(board.controller.in_flight(), 0);
    }

    #[test]
    fn prop_confirmed_moves_land_on_last_drop(
        drops in proptest::collection::vec((0..4i64, 0..3usize, 0..5usize), 1..20),
        order in proptest::collection::vec(0..32usize, 20)
    ) {
        let mut board = Board::new(4);
        let mut last_stage = std::collections::HashMap::new();
        for job in board.directory.jobs() {
            last_stage.insert(job.id, job.current_stage_id);
        }

        for (job_pick, stage_pick, index) in drops {
            let job_id = job_pick + 1;
            board.drop_job(job_id, STAGES[stage_pick], index);
            last_stage.insert(job_id, STAGES[stage_pick]);
        }
        let mut step = 0;
        while !board.outstanding.is_empty() {
            board.complete(order[step % order.len()], true);
            step += 1;
        }

        for (job_id, stage_id) in last_stage {
            let (actual, _) = board.buckets.position(job_id).unwrap();
            prop_assert_eq!(actual, stage_id);
            prop_assert_eq!(board.directory.get(job_id).unwrap().current_stage_id, stage_id);
        }
    }
}
