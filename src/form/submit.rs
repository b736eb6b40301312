use std::fmt::{Debug, Formatter};

use super::engine::{FormEngine, FormId, FormResult, read_lock, write_lock};
use super::value::FormValues;

/// Event handed to a submit handler by the host layer.
pub trait SubmitEvent {
    fn prevent_default(&self);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Submitted,
    Invalid,
}

impl SubmitOutcome {
    pub fn is_submitted(self) -> bool {
        self == SubmitOutcome::Submitted
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct SubmitTracker {
    pub(super) state: SubmitState,
    pub(super) count: u32,
}

impl Default for SubmitTracker {
    fn default() -> Self {
        Self {
            state: SubmitState::Idle,
            count: 0,
        }
    }
}

/// Submit handler bound to a business callback.
///
/// Every call prevents the event's default action, validates all declared
/// fields and invokes the callback with the parsed values only when no
/// validator produced a message.
#[derive(Clone)]
pub struct SubmitHandler<F> {
    engine: FormEngine,
    on_submit: F,
}

impl<F> SubmitHandler<F> {
    pub async fn handle<E>(&self, event: &E) -> FormResult<SubmitOutcome>
    where
        E: SubmitEvent,
        F: Fn(FormValues, &E),
    {
        event.prevent_default();
        self.engine.begin_submit()?;

        let is_valid = match self.engine.validate_all().await {
            Ok(is_valid) => is_valid,
            Err(error) => {
                self.engine.transition_submit(SubmitState::Failed)?;
                return Err(error);
            }
        };
        if !is_valid {
            tracing::debug!(form = %self.engine.id(), "submit blocked by validation errors");
            self.engine.transition_submit(SubmitState::Failed)?;
            return Ok(SubmitOutcome::Invalid);
        }

        let values = self.engine.submission_values()?;
        self.engine.transition_submit(SubmitState::Submitting)?;
        (self.on_submit)(values, event);
        self.engine.transition_submit(SubmitState::Succeeded)?;
        tracing::debug!(form = %self.engine.id(), "form submitted");
        Ok(SubmitOutcome::Submitted)
    }
}

impl<F> Debug for SubmitHandler<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitHandler")
            .field("form", &self.engine.id())
            .finish_non_exhaustive()
    }
}

impl FormEngine {
    pub fn handle_on_submit<F>(&self, on_submit: F) -> SubmitHandler<F> {
        SubmitHandler {
            engine: self.clone(),
            on_submit,
        }
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.submission, "reading submit state")?.state)
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.submission, "reading submit count")?.count)
    }

    /// Current values with every set field replaced by its parsed value,
    /// preferring the parsed-value cache over a fresh parse.
    pub(super) fn submission_values(&self) -> FormResult<FormValues> {
        let runtime = read_lock(&self.runtime, "reading parsers for submit")?;
        let state = read_lock(&self.state, "reading values for submit")?;
        Ok(state
            .value
            .iter()
            .map(|(key, raw)| {
                let value = match raw {
                    None => None,
                    Some(raw) => match runtime.parsed.get(key.as_str()) {
                        Some(parsed) if !parsed.is_null() => Some(parsed.clone()),
                        _ => runtime.parser(key).parse(Some(raw)),
                    },
                };
                (key.clone(), value)
            })
            .collect::<FormValues>())
    }

    fn begin_submit(&self) -> FormResult<()> {
        let mut submission = write_lock(&self.submission, "preparing submit")?;
        record_submit_state(self.id, &mut submission, SubmitState::Validating);
        submission.count = submission.count.saturating_add(1);
        Ok(())
    }

    fn transition_submit(&self, next: SubmitState) -> FormResult<()> {
        let mut submission = write_lock(&self.submission, "updating submit state")?;
        record_submit_state(self.id, &mut submission, next);
        Ok(())
    }
}

/// Records the latest submit state. Overlapping submits, or a reset during a
/// pending submit, produce out-of-order transitions; those are logged and
/// still recorded.
fn record_submit_state(form: FormId, tracker: &mut SubmitTracker, next: SubmitState) {
    let current = tracker.state;
    if current == next {
        return;
    }

    let expected = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !expected {
        tracing::debug!(form = %form, from = ?current, to = ?next, "overlapping submit state change");
    }
    tracker.state = next;
}
