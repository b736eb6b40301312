use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::{FormConfig, Initialized, init};
use super::state::{ErrorMap, FormAction, FormState, RawAction, RequiredMap, reduce};
use super::submit::{SubmitState, SubmitTracker};
use super::validation::{Parser, ValidatorFailure, ValidatorFn};
use super::value::{FieldKey, FieldValue, FormValues, IntoFieldValue};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    UnrecognizedAction {
        kind: String,
    },
    ValidatorFailed {
        field: FieldKey,
        source: ValidatorFailure,
    },
    StatePoisoned(&'static str),
    MissingField {
        field: FieldKey,
    },
    FieldType {
        field: FieldKey,
        expected: &'static str,
    },
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::UnrecognizedAction { kind } => {
                write!(f, "form reducer unrecognized action type: {kind}")
            }
            FormError::ValidatorFailed { field, source } => {
                write!(f, "validator for field `{field}` failed: {source}")
            }
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::MissingField { field } => write!(f, "missing value for field `{field}`"),
            FormError::FieldType { field, expected } => {
                write!(f, "field `{field}` does not hold a {expected} value")
            }
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormError::ValidatorFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type FormResult<T> = Result<T, FormError>;

/// Which fields `clear_errors` targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldSelection {
    /// Every field currently present in the error mapping.
    All,
    Only(Vec<FieldKey>),
}

impl From<&str> for FieldSelection {
    fn from(field: &str) -> Self {
        FieldSelection::Only(vec![FieldKey::from(field)])
    }
}

impl From<String> for FieldSelection {
    fn from(field: String) -> Self {
        FieldSelection::Only(vec![FieldKey::from(field)])
    }
}

impl From<FieldKey> for FieldSelection {
    fn from(field: FieldKey) -> Self {
        FieldSelection::Only(vec![field])
    }
}

impl<K> From<Vec<K>> for FieldSelection
where
    K: Into<FieldKey>,
{
    fn from(fields: Vec<K>) -> Self {
        FieldSelection::Only(fields.into_iter().map(Into::into).collect())
    }
}

impl<K, const N: usize> From<[K; N]> for FieldSelection
where
    K: Into<FieldKey>,
{
    fn from(fields: [K; N]) -> Self {
        FieldSelection::Only(fields.into_iter().map(Into::into).collect())
    }
}

impl<K> From<&[K]> for FieldSelection
where
    K: Into<FieldKey> + Clone,
{
    fn from(fields: &[K]) -> Self {
        FieldSelection::Only(fields.iter().cloned().map(Into::into).collect())
    }
}

/// Parser table, parsed-value cache and validators owned by one engine.
pub(super) struct FieldRuntime {
    pub(super) config: FormConfig,
    pub(super) validators: Vec<(FieldKey, ValidatorFn)>,
    pub(super) parsers: BTreeMap<FieldKey, Parser>,
    pub(super) parsed: FormValues,
}

impl FieldRuntime {
    pub(super) fn validator(&self, key: &FieldKey) -> Option<ValidatorFn> {
        self.validators
            .iter()
            .find_map(|(field, validator)| (field == key).then(|| validator.clone()))
    }

    pub(super) fn parser(&self, key: &FieldKey) -> Parser {
        self.parsers.get(key).cloned().unwrap_or_default()
    }

    pub(super) fn validator_fields(&self) -> Vec<FieldKey> {
        self.validators.iter().map(|(key, _)| key.clone()).collect()
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub value: FormValues,
    pub error: ErrorMap,
    pub required: RequiredMap,
    pub is_blank: bool,
    pub is_invalid: bool,
    pub has_blank_required: bool,
    pub has_validation_error: bool,
    pub submit_state: SubmitState,
    pub submit_count: u32,
}

/// Handle to one form's state. Clones share the same state.
#[derive(Clone)]
pub struct FormEngine {
    pub(super) id: FormId,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) runtime: Arc<RwLock<FieldRuntime>>,
    pub(super) submission: Arc<RwLock<SubmitTracker>>,
}

impl FormEngine {
    pub fn new(config: FormConfig) -> Self {
        let Initialized {
            validators,
            state,
            parsers,
        } = init(&config);
        let id = FormId::next();
        tracing::debug!(form = %id, validators = validators.len(), "form initialized");
        Self {
            id,
            state: Arc::new(RwLock::new(state)),
            runtime: Arc::new(RwLock::new(FieldRuntime {
                config,
                validators,
                parsers,
                parsed: FormValues::new(),
            })),
            submission: Arc::new(RwLock::new(SubmitTracker::default())),
        }
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    /// Replaces the declared fields and recomputes all state from `config`.
    /// Nothing from the previous session is kept.
    pub fn reconfigure(&self, config: FormConfig) -> FormResult<()> {
        let Initialized {
            validators,
            state,
            parsers,
        } = init(&config);
        let mut runtime = write_lock(&self.runtime, "reconfiguring form")?;
        *write_lock(&self.state, "reinitializing form state")? = state;
        *write_lock(&self.submission, "resetting submit state")? = SubmitTracker::default();
        runtime.validators = validators;
        runtime.parsers = parsers;
        runtime.parsed = FormValues::new();
        runtime.config = config;
        tracing::debug!(form = %self.id, validators = runtime.validators.len(), "form reconfigured");
        Ok(())
    }

    /// Re-initializes from the current configuration.
    pub fn reset(&self) -> FormResult<()> {
        let config = read_lock(&self.runtime, "reading config for reset")?
            .config
            .clone();
        self.reconfigure(config)
    }

    pub fn dispatch(&self, action: FormAction) -> FormResult<()> {
        tracing::debug!(form = %self.id, action = %action.kind(), fields = action.len(), "dispatch");
        let mut state = write_lock(&self.state, "dispatching form action")?;
        *state = reduce(std::mem::take(&mut *state), action);
        Ok(())
    }

    /// Untyped dispatch; unknown action kinds fail without touching state.
    pub fn dispatch_raw(&self, action: RawAction) -> FormResult<()> {
        let action = FormAction::try_from(action).inspect_err(|error| {
            tracing::error!(form = %self.id, %error, "rejected form action");
        })?;
        self.dispatch(action)
    }

    pub fn set_value<I, K, V>(&self, payload: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: IntoFieldValue,
    {
        self.dispatch(FormAction::update(payload))
    }

    pub fn set_validation<I, K, M>(&self, payload: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (K, Option<M>)>,
        K: Into<FieldKey>,
        M: Into<String>,
    {
        self.dispatch(FormAction::validate(payload))
    }

    pub fn clear_errors(&self, fields: impl Into<FieldSelection>) -> FormResult<()> {
        let keys = match fields.into() {
            FieldSelection::All => read_lock(&self.state, "reading error keys")?
                .error
                .keys()
                .cloned()
                .collect::<Vec<_>>(),
            FieldSelection::Only(keys) => keys,
        };
        self.dispatch(FormAction::Validate(
            keys.into_iter().map(|key| (key, None)).collect(),
        ))
    }

    pub fn clear_all_errors(&self) -> FormResult<()> {
        self.clear_errors(FieldSelection::All)
    }

    pub fn state(&self) -> FormResult<FormState> {
        Ok(read_lock(&self.state, "reading form state")?.clone())
    }

    pub fn value(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.value.clone())
    }

    pub fn field_value(&self, field: &str) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.state, "reading field value")?
            .value
            .get(field)
            .cloned())
    }

    pub fn error(&self) -> FormResult<ErrorMap> {
        Ok(read_lock(&self.state, "reading form errors")?.error.clone())
    }

    pub fn field_error(&self, field: &str) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .error_message(field)
            .map(str::to_string))
    }

    pub fn required(&self) -> FormResult<RequiredMap> {
        Ok(read_lock(&self.state, "reading required fields")?
            .required
            .clone())
    }

    pub fn is_required(&self, field: &str) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading required flag")?.is_required(field))
    }

    pub fn parser(&self, field: impl Into<FieldKey>) -> FormResult<Parser> {
        Ok(read_lock(&self.runtime, "reading parser table")?.parser(&field.into()))
    }

    pub fn parsed_value(&self, field: &str) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.runtime, "reading parsed value cache")?
            .parsed
            .get(field)
            .cloned())
    }

    pub fn validator_fields(&self) -> FormResult<Vec<FieldKey>> {
        Ok(read_lock(&self.runtime, "reading validator fields")?.validator_fields())
    }

    pub fn is_blank(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "computing blank status")?.is_blank())
    }

    pub fn has_blank_required(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "computing blank required status")?.has_blank_required())
    }

    pub fn has_validation_error(&self) -> FormResult<bool> {
        let fields = self.validator_fields()?;
        Ok(read_lock(&self.state, "computing validation error status")?
            .has_validation_error(&fields))
    }

    pub fn is_invalid(&self) -> FormResult<bool> {
        let fields = self.validator_fields()?;
        Ok(read_lock(&self.state, "computing invalid status")?.is_invalid(&fields))
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let fields = self.validator_fields()?;
        let (submit_state, submit_count) = {
            let submission = read_lock(&self.submission, "reading submit state")?;
            (submission.state, submission.count)
        };
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            value: state.value.clone(),
            error: state.error.clone(),
            required: state.required.clone(),
            is_blank: state.is_blank(),
            is_invalid: state.is_invalid(&fields),
            has_blank_required: state.has_blank_required(),
            has_validation_error: state.has_validation_error(&fields),
            submit_state,
            submit_count,
        })
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
