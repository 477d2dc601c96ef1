//! Application state accumulator for the dashboard.
//!
//! [`AppState`] is the single source of truth for everything the dashboard
//! draws. Console events are applied via [`AppState::apply_event`]; key
//! presses mutate the form, focus and selection directly. Each render frame
//! reads from `AppState` to produce the UI (immediate-mode rendering).

use std::collections::VecDeque;

use crate::event::ConsoleEvent;
use crate::health::HealthSnapshot;
use crate::inventory::{AgentRecord, InventorySummary};
use crate::notify::Notice;
use crate::session::{SpawnMode, SpawnState};
use crate::spawn::ProgressEstimate;
use crate::tui::form::SpawnForm;

/// Oldest notices are dropped beyond this many.
pub const MAX_NOTICES: usize = 50;

/// Which panel receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Agents,
    Form,
}

pub struct AppState {
    // -- Bridge --
    pub health: HealthSnapshot,
    pub agents: Vec<AgentRecord>,

    // -- Spawn --
    pub spawn: SpawnState,
    /// Latest estimate for the owned spawn; cleared when the session
    /// returns to idle.
    pub progress: Option<ProgressEstimate>,
    pub form: SpawnForm,

    // -- Notices (newest at back) --
    pub notices: VecDeque<Notice>,

    // -- Navigation --
    pub focus: Focus,
    pub selected_agent: usize,

    // -- Confirmations --
    /// Agent id awaiting a y/n stop confirmation.
    pub stop_pending: Option<String>,
    /// True after the first 'q' press; a second 'q' or 'y' confirms quit.
    pub quit_pending: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            health: HealthSnapshot::offline(),
            agents: Vec::new(),
            spawn: SpawnState::default(),
            progress: None,
            form: SpawnForm::new(),
            notices: VecDeque::new(),
            focus: Focus::Agents,
            selected_agent: 0,
            stop_pending: None,
            quit_pending: false,
        }
    }

    /// Apply a console event. This is the sole mutation path for state that
    /// originates outside the dashboard.
    pub fn apply_event(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Health(snapshot) => {
                self.health = snapshot;
            }

            ConsoleEvent::Inventory(agents) => {
                self.agents = agents;
                self.selected_agent = self
                    .selected_agent
                    .min(self.agents.len().saturating_sub(1));
            }

            ConsoleEvent::SpawnState(state) => {
                if state.is_idle() || state.attempt() != self.spawn.attempt() {
                    self.progress = None;
                }
                self.spawn = state;
            }

            ConsoleEvent::Progress(estimate) => {
                if self.spawn.mode() == SpawnMode::Owned {
                    self.progress = Some(estimate);
                }
            }

            ConsoleEvent::Notice(notice) => {
                self.notices.push_back(notice);
                while self.notices.len() > MAX_NOTICES {
                    self.notices.pop_front();
                }
            }

            ConsoleEvent::SpawnFinished(outcome) => {
                if outcome.is_success() {
                    self.form.clear();
                }
            }
        }
    }

    /// Submitting is only possible while no spawn is owned or observed.
    pub fn submit_enabled(&self) -> bool {
        self.spawn.is_idle()
    }

    /// Label for the spawn panel, `None` when idle.
    pub fn spawn_label(&self) -> Option<String> {
        let agent_id = self.spawn.agent_id().unwrap_or("?");
        match self.spawn.mode() {
            SpawnMode::Idle => None,
            SpawnMode::Owned => Some(format!("Spawning \"{agent_id}\"...")),
            SpawnMode::Observing => Some(format!("Spawn in progress: {agent_id}")),
        }
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary::of(&self.agents)
    }

    pub fn selected_agent_id(&self) -> Option<&str> {
        self.agents
            .get(self.selected_agent)
            .map(|agent| agent.id.as_str())
    }

    pub fn select_next(&mut self) {
        if !self.agents.is_empty() {
            self.selected_agent = (self.selected_agent + 1).min(self.agents.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_agent = self.selected_agent.saturating_sub(1);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notice;
    use crate::session::SharedSpawnState;
    use crate::spawn::{SpawnMeta, SpawnOutcome};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    fn agents(ids: &[&str]) -> Vec<AgentRecord> {
        ids.iter()
            .map(|id| AgentRecord::from_entry(id, &json!({"pid": 1})))
            .collect()
    }

    /// Drive a real session state and collect the snapshots it publishes.
    fn spawn_states(mode: SpawnMode, agent_id: &str) -> (SpawnState, SpawnState) {
        let (tx, mut rx) = unbounded_channel();
        let shared = SharedSpawnState::new(Some(tx));
        let attempt = match mode {
            SpawnMode::Observing => shared.begin_observing(agent_id).unwrap(),
            _ => shared.begin_owned(agent_id).unwrap(),
        };
        attempt.settle();

        let mut states = Vec::new();
        while let Ok(ConsoleEvent::SpawnState(s)) = rx.try_recv() {
            states.push(s);
        }
        (states[0].clone(), states[1].clone())
    }

    #[test]
    fn new_state_has_correct_defaults() {
        let state = AppState::new();
        assert!(!state.health.online);
        assert!(state.agents.is_empty());
        assert!(state.submit_enabled());
        assert!(state.spawn_label().is_none());
        assert_eq!(state.focus, Focus::Agents);
        assert!(!state.quit_pending);
        assert!(state.stop_pending.is_none());
    }

    #[test]
    fn observing_disables_submit_and_labels_agent() {
        let mut state = AppState::new();
        let (observing, idle) = spawn_states(SpawnMode::Observing, "bot3");

        state.apply_event(ConsoleEvent::SpawnState(observing));
        assert!(!state.submit_enabled());
        assert_eq!(state.spawn_label().as_deref(), Some("Spawn in progress: bot3"));

        state.apply_event(ConsoleEvent::SpawnState(idle));
        assert!(state.submit_enabled());
        assert!(state.spawn_label().is_none());
    }

    #[test]
    fn progress_only_tracked_while_owned() {
        let mut state = AppState::new();
        let estimate = ProgressEstimate::estimate(Duration::from_secs(30), Duration::from_secs(180));

        state.apply_event(ConsoleEvent::Progress(estimate));
        assert!(state.progress.is_none());

        let (owned, idle) = spawn_states(SpawnMode::Owned, "bot1");
        state.apply_event(ConsoleEvent::SpawnState(owned));
        state.apply_event(ConsoleEvent::Progress(estimate));
        assert_eq!(state.progress, Some(estimate));

        state.apply_event(ConsoleEvent::SpawnState(idle));
        assert!(state.progress.is_none());
    }

    #[test]
    fn notices_are_capped() {
        let mut state = AppState::new();
        for i in 0..(MAX_NOTICES + 5) {
            state.apply_event(ConsoleEvent::Notice(Notice::info(format!("n{i}"), "")));
        }
        assert_eq!(state.notices.len(), MAX_NOTICES);
        assert_eq!(state.notices.front().unwrap().title, "n5");
    }

    #[test]
    fn inventory_clamps_selection() {
        let mut state = AppState::new();
        state.apply_event(ConsoleEvent::Inventory(agents(&["a", "b", "c"])));
        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(state.selected_agent_id(), Some("c"));

        state.apply_event(ConsoleEvent::Inventory(agents(&["a"])));
        assert_eq!(state.selected_agent_id(), Some("a"));

        state.apply_event(ConsoleEvent::Inventory(Vec::new()));
        assert_eq!(state.selected_agent_id(), None);
        state.select_next();
        assert_eq!(state.selected_agent, 0);
    }

    #[test]
    fn successful_spawn_clears_form() {
        let mut state = AppState::new();
        state.form.agent_id = "bot1".into();
        state.apply_event(ConsoleEvent::SpawnFinished(SpawnOutcome::Busy("x".into())));
        assert_eq!(state.form.agent_id, "bot1");

        state.apply_event(ConsoleEvent::SpawnFinished(SpawnOutcome::Success(SpawnMeta {
            agent_id: "bot1".into(),
            port: Some(8101),
            pid: Some(4521),
            guild_configured: true,
        })));
        assert!(state.form.agent_id.is_empty());
    }

    #[test]
    fn summary_counts_agents() {
        let mut state = AppState::new();
        state.apply_event(ConsoleEvent::Inventory(agents(&["a", "b"])));
        assert_eq!(state.summary(), InventorySummary { total: 2, active: 2 });
    }
}
