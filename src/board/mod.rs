//! Kanban workflow board: optimistic stage moves against a remote backend.
//!
//! ## Overview
//!
//! A workflow is an ordered list of stages; each stage is a board column
//! and every job of the workflow sits in exactly one of them. Dragging a
//! card to another column moves it locally at once and sends the stage
//! change to the backend. A confirmation merges the server's record onto
//! the job; a rejection puts the card back exactly where it came from and
//! raises a user notification.
//!
//! ## Module Map
//!
//! ```text
//!  gesture (DropEvent)
//!        │
//!        v
//! ┌───────────────────────────────────────────────────────────────┐
//! │ session.rs  (BoardSession: single owner, &mut self API)       │
//! │    ├─ catalog.rs    WorkflowCatalog  (stages sorted)          │
//! │    ├─ directory.rs  JobDirectory     (jobs of one workflow)   │
//! │    ├─ buckets.rs    StageBuckets     (stage → ordered jobs)   │
//! │    └─ transfer.rs   DragTransferController                   │
//! │             │  Idle → Applied → Confirmed | RolledBack        │
//! │             │                                                 │
//! │             │ tokio::spawn(set_job_stage) ── mpsc ──┐         │
//! │             v                                       │         │
//! │  backend.rs  BoardBackend trait ◄───────────────────┘         │
//! │    ├─ HttpBackend    (reqwest, REST)                          │
//! │    └─ memory.rs InMemoryBackend (tests, demos)                │
//! │  events.rs   BoardEvent → broadcast channel (JSON)            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Flow (drag a job to the next stage)
//!
//! 1. `BoardSession::on_drop(event)` → `DragTransferController::on_drop`
//!    moves the job between buckets and sets its `current_stage_id`.
//! 2. The session spawns `BoardBackend::set_job_stage` and publishes
//!    `BoardEvent::JobMoved`.
//! 3. `BoardSession::next_completion()` receives the response and calls
//!    `DragTransferController::complete`, which either merges the server
//!    record or rolls the move back and publishes a `Notification`.

pub mod backend;
pub mod buckets;
pub mod catalog;
pub mod directory;
pub mod events;
pub mod memory;
pub mod models;
pub mod render;
pub mod session;
pub mod transfer;

pub use backend::{BoardBackend, HttpBackend};
pub use buckets::StageBuckets;
pub use catalog::WorkflowCatalog;
pub use directory::JobDirectory;
pub use events::BoardEvent;
pub use memory::InMemoryBackend;
pub use models::{Job, Stage, Workflow};
pub use session::{BoardSession, BoardStatus};
pub use transfer::{Completion, DragTransferController, DropEvent, DropOutcome, MoveState};
