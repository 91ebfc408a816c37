use std::time::{Duration, Instant};

use crate::domain::value_objects::BridgeState;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: BridgeState,
    pub to: BridgeState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Domain entity tracking the lifecycle of one bridge
#[derive(Debug)]
pub struct BridgeLifecycle {
    current_state: BridgeState,
    state_history: Vec<StateTransition>,
    running_since: Option<Instant>,
}

impl BridgeLifecycle {
    pub fn new() -> Self {
        Self {
            current_state: BridgeState::Created,
            state_history: Vec::new(),
            running_since: None,
        }
    }

    pub fn current_state(&self) -> BridgeState {
        self.current_state
    }

    /// Time spent relaying, if the bridge ever reached Running
    pub fn uptime(&self) -> Option<Duration> {
        self.running_since.map(|start| start.elapsed())
    }

    pub fn transition_count(&self) -> usize {
        self.state_history.len()
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.last()
    }

    /// States visited so far, starting with the initial one
    pub fn visited_states(&self) -> Vec<BridgeState> {
        let mut states = vec![BridgeState::Created];
        states.extend(self.state_history.iter().map(|t| t.to));
        states
    }

    pub fn transition_to_starting(&mut self) {
        self.record_transition(BridgeState::Starting, None);
    }

    pub fn transition_to_connecting(&mut self) {
        self.record_transition(BridgeState::Connecting, None);
    }

    pub fn transition_to_running(&mut self) {
        self.record_transition(BridgeState::Running, None);

        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn transition_to_stopping(&mut self) {
        self.record_transition(BridgeState::Stopping, None);
    }

    pub fn transition_to_stopped(&mut self) {
        self.record_transition(BridgeState::Stopped, None);
    }

    pub fn transition_to_failed(&mut self, reason: Option<String>) {
        self.record_transition(BridgeState::Failed, reason);
    }

    fn record_transition(&mut self, new_state: BridgeState, reason: Option<String>) {
        // terminal states are sticky
        if self.current_state.is_terminal() {
            return;
        }

        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        self.state_history.push(transition);
        self.current_state = new_state;
    }
}

impl Default for BridgeLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
