use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::engine::{FormEngine, FormError, FormResult, read_lock, write_lock};
use super::state::FormAction;
use super::value::{FieldKey, FieldValue, FormValues};

/// Failure raised by a validator itself, as opposed to a validation message.
#[derive(Clone)]
pub struct ValidatorFailure(Arc<dyn Error + Send + Sync + 'static>);

impl ValidatorFailure {
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(Arc::from(error.into()))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }

    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl Debug for ValidatorFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValidatorFailure")
            .field(&self.0.to_string())
            .finish()
    }
}

impl Display for ValidatorFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl PartialEq for ValidatorFailure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

impl Error for ValidatorFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

pub type ValidationResult = Result<Option<String>, ValidatorFailure>;

pub type BoxedValidationFuture = Pin<Box<dyn Future<Output = ValidationResult> + Send + 'static>>;

pub(super) type ValidatorFn = Arc<dyn Fn(FormValues, bool) -> BoxedValidationFuture + Send + Sync>;

/// Synchronous validator: reads the merged value set and returns an optional message.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, values: &FormValues, run_async_check: bool) -> Option<String>;
}

impl<F> FieldValidator for F
where
    F: Fn(&FormValues, bool) -> Option<String> + Send + Sync,
{
    fn validate(&self, values: &FormValues, run_async_check: bool) -> Option<String> {
        (self)(values, run_async_check)
    }
}

/// Asynchronous validator, e.g. one that consults a remote service when
/// `run_async_check` is set.
pub trait AsyncFieldValidator: Send + Sync {
    fn validate(&self, values: FormValues, run_async_check: bool) -> BoxedValidationFuture;
}

impl<F, Fut> AsyncFieldValidator for F
where
    F: Fn(FormValues, bool) -> Fut + Send + Sync,
    Fut: Future<Output = ValidationResult> + Send + 'static,
{
    fn validate(&self, values: FormValues, run_async_check: bool) -> BoxedValidationFuture {
        Box::pin((self)(values, run_async_check))
    }
}

// Erased validators run on first poll, after the caller has released the engine locks.
pub(super) fn erase_sync<V>(validator: V) -> ValidatorFn
where
    V: FieldValidator + 'static,
{
    let validator = Arc::new(validator);
    Arc::new(move |values: FormValues, run_async_check: bool| {
        let validator = validator.clone();
        Box::pin(async move { Ok(validator.validate(&values, run_async_check)) })
            as BoxedValidationFuture
    })
}

pub(super) fn erase_async<V>(validator: V) -> ValidatorFn
where
    V: AsyncFieldValidator + 'static,
{
    let validator = Arc::new(validator);
    Arc::new(move |values: FormValues, run_async_check: bool| {
        let validator = validator.clone();
        Box::pin(async move { validator.validate(values, run_async_check).await })
            as BoxedValidationFuture
    })
}

type ParseFn = dyn Fn(Option<&FieldValue>) -> Option<FieldValue> + Send + Sync;

/// Maps a raw input value to the value handed to validators and submitted.
#[derive(Clone)]
pub struct Parser {
    name: &'static str,
    parse: Arc<ParseFn>,
}

impl Parser {
    pub fn new<F>(parse: F) -> Self
    where
        F: Fn(Option<&FieldValue>) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            parse: Arc::new(parse),
        }
    }

    pub fn identity() -> Self {
        Self {
            name: "identity",
            parse: Arc::new(|value| value.cloned()),
        }
    }

    /// Whole-value integer parse; anything that is not an integer becomes `NaN`.
    pub fn int() -> Self {
        Self {
            name: "int",
            parse: Arc::new(|value| Some(parse_int(value))),
        }
    }

    /// Numeric coercion: empty text and null become `0`, unparsable input `NaN`.
    pub fn number() -> Self {
        Self {
            name: "number",
            parse: Arc::new(|value| Some(parse_number(value))),
        }
    }

    /// Exact decimal parse; unparsable input is kept as-is so validators can reject it.
    pub fn decimal() -> Self {
        Self {
            name: "decimal",
            parse: Arc::new(|value| value.map(parse_decimal)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parse(&self, value: Option<&FieldValue>) -> Option<FieldValue> {
        (self.parse)(value)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::identity()
    }
}

impl Debug for Parser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").field("name", &self.name).finish()
    }
}

fn parse_int(value: Option<&FieldValue>) -> FieldValue {
    match value {
        Some(FieldValue::Int(value)) => FieldValue::Int(*value),
        Some(FieldValue::Number(value)) if value.fract() == 0.0 => value
            .to_i64()
            .map_or(FieldValue::Number(f64::NAN), FieldValue::Int),
        Some(FieldValue::Decimal(value)) if value.fract().is_zero() => {
            value
                .to_i64()
                .map_or(FieldValue::Number(f64::NAN), FieldValue::Int)
        }
        Some(FieldValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_or(FieldValue::Number(f64::NAN), FieldValue::Int),
        _ => FieldValue::Number(f64::NAN),
    }
}

fn parse_number(value: Option<&FieldValue>) -> FieldValue {
    match value {
        None => FieldValue::Number(f64::NAN),
        Some(FieldValue::Null) => FieldValue::Number(0.0),
        Some(FieldValue::Bool(value)) => FieldValue::Number(if *value { 1.0 } else { 0.0 }),
        Some(FieldValue::Int(value)) => FieldValue::Number(*value as f64),
        Some(FieldValue::Number(value)) => FieldValue::Number(*value),
        Some(FieldValue::Decimal(value)) => {
            FieldValue::Number(FieldValue::Decimal(*value).as_f64().unwrap_or(f64::NAN))
        }
        Some(FieldValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                FieldValue::Number(0.0)
            } else {
                FieldValue::Number(trimmed.parse::<f64>().unwrap_or(f64::NAN))
            }
        }
        Some(FieldValue::List(_)) => FieldValue::Number(f64::NAN),
    }
}

fn parse_decimal(value: &FieldValue) -> FieldValue {
    let parsed = match value {
        FieldValue::Int(value) => Some(Decimal::from(*value)),
        FieldValue::Number(value) => Decimal::try_from(*value).ok(),
        FieldValue::Text(text) => Decimal::from_str(text.trim()).ok(),
        FieldValue::Decimal(value) => Some(*value),
        _ => None,
    };
    parsed.map_or_else(|| value.clone(), FieldValue::Decimal)
}

impl FormEngine {
    /// Parses `raw` for `key`, runs its validator against the merged value
    /// view and stores the outcome as the field's error.
    ///
    /// Fields without a validator are left alone.
    pub(super) async fn revalidate_field(
        &self,
        key: &FieldKey,
        parser: &Parser,
        raw: Option<FieldValue>,
        run_async_check: bool,
    ) -> FormResult<()> {
        let pending = {
            let mut runtime = write_lock(&self.runtime, "parsing field for validation")?;
            let Some(validator) = runtime.validator(key) else {
                return Ok(());
            };
            let parsed = parser.parse(raw.as_ref());
            tracing::trace!(form = %self.id(), field = %key, parser = parser.name(), "parsed field value");
            runtime.parsed.insert(key.clone(), parsed);
            let state = read_lock(&self.state, "reading values for field validation")?;
            let merged = state.value.overlay(&runtime.parsed);
            validator(merged, run_async_check)
        };

        let message = pending.await.map_err(|source| {
            tracing::warn!(form = %self.id(), field = %key, error = %source, "validator failed");
            FormError::ValidatorFailed {
                field: key.clone(),
                source,
            }
        })?;
        self.dispatch(FormAction::Validate(
            [(key.clone(), message)].into_iter().collect(),
        ))
    }

    /// Runs every declared validator concurrently without async checks and
    /// applies the non-empty messages in declaration order.
    pub(super) async fn validate_all(&self) -> FormResult<bool> {
        let (fields, pending) = {
            let mut runtime = write_lock(&self.runtime, "parsing fields for form validation")?;
            let state = read_lock(&self.state, "reading values for form validation")?;
            let validators = runtime.validators.clone();
            let mut fields = Vec::with_capacity(validators.len());
            let mut pending = Vec::with_capacity(validators.len());
            for (key, validator) in validators {
                let parsed = runtime.parser(&key).parse(state.value.get(key.as_str()));
                runtime.parsed.insert(key.clone(), parsed);
                let merged = state.value.overlay(&runtime.parsed);
                pending.push(validator(merged, false));
                fields.push(key);
            }
            (fields, pending)
        };

        tracing::debug!(form = %self.id(), validators = fields.len(), "validating all fields");
        let results = join_all(pending).await;

        let mut messages = Vec::with_capacity(results.len());
        for (key, result) in fields.into_iter().zip(results) {
            match result {
                Ok(message) => messages.push((key, message)),
                Err(source) => {
                    tracing::warn!(form = %self.id(), field = %key, error = %source, "validator failed");
                    return Err(FormError::ValidatorFailed { field: key, source });
                }
            }
        }

        let mut found_error = false;
        for (key, message) in messages {
            if let Some(message) = message.filter(|message| !message.is_empty()) {
                found_error = true;
                self.dispatch(FormAction::Validate(
                    [(key, Some(message))].into_iter().collect(),
                ))?;
            }
        }
        Ok(!found_error)
    }
}
