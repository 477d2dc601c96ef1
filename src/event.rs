//! Events published by the console components.
//!
//! The health prober, inventory loader, session state and spawn coordinator
//! each push into one unbounded channel; the dashboard drains it and folds
//! every event into its render state.

use crate::health::HealthSnapshot;
use crate::inventory::AgentRecord;
use crate::notify::Notice;
use crate::session::SpawnState;
use crate::spawn::{ProgressEstimate, SpawnOutcome};

#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// Result of a health probe (online or offline).
    Health(HealthSnapshot),
    /// A fresh inventory replaced the previous one.
    Inventory(Vec<AgentRecord>),
    /// The session's spawn state changed.
    SpawnState(SpawnState),
    /// Cosmetic progress tick for the owned spawn.
    Progress(ProgressEstimate),
    /// A user-facing notice.
    Notice(Notice),
    /// An owned spawn attempt resolved.
    SpawnFinished(SpawnOutcome),
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<ConsoleEvent>;

/// Send an event if a channel is attached. A closed receiver is not an error:
/// the dashboard may already have exited.
pub(crate) fn emit(events: Option<&EventSender>, event: ConsoleEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
