use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::engine::FormError;
use super::value::{FieldKey, FieldValue, FormValues, IntoFieldValue};

pub type ErrorMap = BTreeMap<FieldKey, Option<String>>;
pub type RequiredMap = BTreeMap<FieldKey, bool>;

/// Reducer state: three parallel mappings keyed by field name.
///
/// Keys are never removed. A cleared error or an unset value keeps its key
/// and holds `None`; absent keys read as `None`/`false`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub value: FormValues,
    pub error: ErrorMap,
    pub required: RequiredMap,
}

impl FormState {
    pub fn error_message(&self, key: &str) -> Option<&str> {
        self.error.get(key).and_then(Option::as_deref)
    }

    /// A field is in error only when its message is present and non-empty.
    pub fn has_error(&self, key: &str) -> bool {
        self.error_message(key)
            .is_some_and(|message| !message.is_empty())
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.get(key).copied().unwrap_or(false)
    }

    pub fn is_blank(&self) -> bool {
        self.value.iter().all(|(_, value)| value.is_none())
    }

    pub fn has_blank_required(&self) -> bool {
        self.required
            .iter()
            .filter(|(_, required)| **required)
            .any(|(key, _)| self.value.is_undefined(key.as_str()))
    }

    pub fn has_validation_error(&self, validator_fields: &[FieldKey]) -> bool {
        validator_fields
            .iter()
            .any(|key| self.has_error(key.as_str()))
    }

    pub fn is_invalid(&self, validator_fields: &[FieldKey]) -> bool {
        self.has_blank_required() || self.has_validation_error(validator_fields)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionKind {
    Update,
    Validate,
    Required,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Update => "update",
            ActionKind::Validate => "validate",
            ActionKind::Required => "required",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = FormError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "update" => Ok(ActionKind::Update),
            "validate" => Ok(ActionKind::Validate),
            "required" => Ok(ActionKind::Required),
            other => Err(FormError::UnrecognizedAction {
                kind: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormAction {
    Update(FormValues),
    Validate(ErrorMap),
    Required(RequiredMap),
}

impl FormAction {
    pub fn update<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: IntoFieldValue,
    {
        FormAction::Update(entries.into_iter().collect())
    }

    pub fn validate<I, K, M>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<M>)>,
        K: Into<FieldKey>,
        M: Into<String>,
    {
        FormAction::Validate(
            entries
                .into_iter()
                .map(|(key, message)| (key.into(), message.map(Into::into)))
                .collect(),
        )
    }

    pub fn required<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<FieldKey>,
    {
        FormAction::Required(
            entries
                .into_iter()
                .map(|(key, required)| (key.into(), required))
                .collect(),
        )
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            FormAction::Update(_) => ActionKind::Update,
            FormAction::Validate(_) => ActionKind::Validate,
            FormAction::Required(_) => ActionKind::Required,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FormAction::Update(payload) => payload.len(),
            FormAction::Validate(payload) => payload.len(),
            FormAction::Required(payload) => payload.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Untyped action as a host layer would send it: a kind name and a value payload.
#[derive(Clone, Debug, PartialEq)]
pub struct RawAction {
    pub kind: String,
    pub payload: FormValues,
}

impl RawAction {
    pub fn new(kind: impl Into<String>, payload: FormValues) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

impl TryFrom<RawAction> for FormAction {
    type Error = FormError;

    fn try_from(action: RawAction) -> Result<Self, Self::Error> {
        let kind = action.kind.parse::<ActionKind>()?;
        Ok(match kind {
            ActionKind::Update => FormAction::Update(action.payload),
            ActionKind::Validate => FormAction::Validate(
                action
                    .payload
                    .into_iter()
                    .map(|(key, value)| (key, value.map(message_from_value)))
                    .collect(),
            ),
            ActionKind::Required => FormAction::Required(
                action
                    .payload
                    .into_iter()
                    .map(|(key, value)| (key, value.as_ref().is_some_and(FieldValue::is_truthy)))
                    .collect(),
            ),
        })
    }
}

fn message_from_value(value: FieldValue) -> String {
    match value {
        FieldValue::Text(message) => message,
        other => other.to_string(),
    }
}

/// Pure transition: shallow-merges the payload into the mapping the action targets.
pub fn reduce(mut state: FormState, action: FormAction) -> FormState {
    match action {
        FormAction::Update(payload) => state.value.merge(payload),
        FormAction::Validate(payload) => state.error.extend(payload),
        FormAction::Required(payload) => state.required.extend(payload),
    }
    state
}
