use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use super::model::FormModel;
use super::state::FormState;
use super::validation::{
    AsyncFieldValidator, FieldValidator, Parser, ValidatorFn, erase_async, erase_sync,
};
use super::value::{FieldKey, FormValues, IntoFieldValue};

/// Validators and initial values a form is built from.
///
/// Validators keep their declaration order; submit applies results in that
/// order. Declaring the same field twice replaces the validator in place.
/// A config carrying only initial values has no validators.
#[derive(Clone, Default)]
pub struct FormConfig {
    pub(super) validators: Vec<(FieldKey, ValidatorFn)>,
    pub(super) initial_values: Option<FormValues>,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_initial_values(values: FormValues) -> Self {
        Self {
            validators: Vec::new(),
            initial_values: Some(values),
        }
    }

    /// Bare validator map: one sync validator per field, in iteration order.
    pub fn from_validators<I, K, V>(validators: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldKey>,
        V: FieldValidator + 'static,
    {
        validators
            .into_iter()
            .fold(Self::new(), |config, (field, validator)| {
                config.validator(field, validator)
            })
    }

    pub fn validator<V>(mut self, field: impl Into<FieldKey>, validator: V) -> Self
    where
        V: FieldValidator + 'static,
    {
        self.declare(field.into(), erase_sync(validator));
        self
    }

    pub fn async_validator<V>(mut self, field: impl Into<FieldKey>, validator: V) -> Self
    where
        V: AsyncFieldValidator + 'static,
    {
        self.declare(field.into(), erase_async(validator));
        self
    }

    pub fn initial_values(mut self, values: FormValues) -> Self {
        self.initial_values = Some(values);
        self
    }

    pub fn initial_value(mut self, field: impl Into<FieldKey>, value: impl IntoFieldValue) -> Self {
        self.initial_values
            .get_or_insert_with(FormValues::new)
            .insert(field, value);
        self
    }

    pub fn initial_model<M>(self, model: &M) -> Self
    where
        M: FormModel,
    {
        self.initial_values(model.to_values())
    }

    pub fn validator_fields(&self) -> Vec<FieldKey> {
        self.validators.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn has_initial_values(&self) -> bool {
        self.initial_values.is_some()
    }

    fn declare(&mut self, field: FieldKey, validator: ValidatorFn) {
        match self.validators.iter_mut().find(|(key, _)| *key == field) {
            Some(slot) => slot.1 = validator,
            None => self.validators.push((field, validator)),
        }
    }
}

impl From<FormValues> for FormConfig {
    fn from(values: FormValues) -> Self {
        Self::from_initial_values(values)
    }
}

impl Debug for FormConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfig")
            .field("validators", &self.validator_fields())
            .field("initial_values", &self.initial_values)
            .finish()
    }
}

pub(super) struct Initialized {
    pub(super) validators: Vec<(FieldKey, ValidatorFn)>,
    pub(super) state: FormState,
    pub(super) parsers: BTreeMap<FieldKey, Parser>,
}

/// Seeds every declared field as unset, not in error and not required, then
/// overlays the initial values.
pub(super) fn init(config: &FormConfig) -> Initialized {
    let mut state = FormState::default();
    let mut parsers = BTreeMap::new();

    for (key, _) in &config.validators {
        state.value.unset(key.clone());
        state.error.insert(key.clone(), None);
        state.required.insert(key.clone(), false);
        parsers.insert(key.clone(), Parser::identity());
    }

    if let Some(initial) = &config.initial_values {
        state.value.merge(initial.clone());
    }

    Initialized {
        validators: config.validators.clone(),
        state,
        parsers,
    }
}
