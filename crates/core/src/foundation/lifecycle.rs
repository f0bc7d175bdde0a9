use crate::errors::CoreError;
use std::sync::Mutex;

/// Lifecycle states of a one-shot built component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Building,
    Built,
    Finalized,
    Failed,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Created, Building)
                | (Failed, Building)
                | (Building, Built)
                | (Building, Failed)
                | (Built, Finalized)
        )
    }

    /// A successful build has completed (finalized or not)
    pub fn is_built(self) -> bool {
        matches!(self, LifecycleState::Built | LifecycleState::Finalized)
    }
}

/// Tracks the lifecycle state of a named component
#[derive(Debug)]
pub struct LifecycleManager {
    component: String,
    state: Mutex<LifecycleState>,
}

impl LifecycleManager {
    /// Create a new lifecycle manager in the `Created` state
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            state: Mutex::new(LifecycleState::Created),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move to `next`, failing if the transition is not allowed
    pub fn transition(&self, next: LifecycleState) -> Result<LifecycleState, CoreError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = *state;
        if !previous.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                component: self.component.clone(),
                from: previous,
                to: next,
            });
        }
        *state = next;
        tracing::trace!("{}: {:?} -> {:?}", self.component, previous, next);
        Ok(previous)
    }

    /// Return to `Created`; used when the component's inputs change
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            LifecycleState::Created;
    }
}
