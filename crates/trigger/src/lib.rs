//! The trigger subsystem: cron (C8), file-event (C9), and manual (C10)
//! execution sources, each ultimately calling into
//! [`nebula_wf_engine::WorkflowEngine::submit`].

pub mod cron;
pub mod error;
pub mod file_event;
pub mod manual;

pub use cron::CronTrigger;
pub use error::TriggerError;
pub use file_event::FileEventTrigger;
pub use manual::ManualTrigger;
