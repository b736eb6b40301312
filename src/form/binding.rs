use std::fmt::{Debug, Formatter};

use super::engine::{FormEngine, FormResult, read_lock, write_lock};
use super::state::FormAction;
use super::validation::Parser;
use super::value::{FieldKey, FieldValue, IntoFieldValue};

/// Options for [`FormEngine::register`].
///
/// Parser precedence: `parse_as_int`, then `parse_as_number`, then
/// `parse_as_decimal`, then an explicit `parser`, then identity.
#[derive(Clone, Debug, Default)]
pub struct RegisterOptions {
    pub required: bool,
    /// Read `checked` instead of `value` from change events.
    pub binary: bool,
    pub run_async_check: bool,
    pub parser: Option<Parser>,
    pub parse_as_int: bool,
    pub parse_as_number: bool,
    pub parse_as_decimal: bool,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn run_async_check(mut self, run_async_check: bool) -> Self {
        self.run_async_check = run_async_check;
        self
    }

    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn parse_as_int(mut self, parse_as_int: bool) -> Self {
        self.parse_as_int = parse_as_int;
        self
    }

    pub fn parse_as_number(mut self, parse_as_number: bool) -> Self {
        self.parse_as_number = parse_as_number;
        self
    }

    pub fn parse_as_decimal(mut self, parse_as_decimal: bool) -> Self {
        self.parse_as_decimal = parse_as_decimal;
        self
    }

    pub fn resolve_parser(&self) -> Parser {
        if self.parse_as_int {
            return Parser::int();
        }
        if self.parse_as_number {
            return Parser::number();
        }
        if self.parse_as_decimal {
            return Parser::decimal();
        }
        self.parser.clone().unwrap_or_default()
    }
}

/// Change event from an input element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeEvent {
    pub value: Option<FieldValue>,
    pub checked: Option<bool>,
}

impl ChangeEvent {
    pub fn with_value(value: impl IntoFieldValue) -> Self {
        Self {
            value: value.into_field_value(),
            checked: None,
        }
    }

    pub fn with_checked(checked: bool) -> Self {
        Self {
            value: None,
            checked: Some(checked),
        }
    }

    pub fn raw_value(&self, binary: bool) -> Option<FieldValue> {
        if binary {
            self.checked.map(FieldValue::Bool)
        } else {
            self.value.clone()
        }
    }
}

/// What an input element needs from [`FormEngine::register`]: the current
/// value, the required flag and the change/blur handlers.
#[derive(Clone)]
pub struct FieldBinding {
    pub name: FieldKey,
    pub value: FieldValue,
    pub required: bool,
    binary: bool,
    run_async_check: bool,
    parser: Parser,
    engine: FormEngine,
}

impl FieldBinding {
    /// Stores the raw value. Re-validates only while the field is in error.
    pub async fn on_change(&self, event: &ChangeEvent) -> FormResult<()> {
        let raw = event.raw_value(self.binary);
        self.engine
            .dispatch(FormAction::Update([(self.name.clone(), raw.clone())].into_iter().collect()))?;

        let has_error = read_lock(&self.engine.state, "reading field error for change")?
            .has_error(self.name.as_str());
        if !has_error {
            return Ok(());
        }
        self.engine
            .revalidate_field(&self.name, &self.parser, raw, false)
            .await
    }

    /// Validates the stored value; a no-op for fields without a validator.
    pub async fn on_blur(&self) -> FormResult<()> {
        let raw = read_lock(&self.engine.state, "reading field value for blur")?
            .value
            .get(self.name.as_str())
            .cloned();
        self.engine
            .revalidate_field(&self.name, &self.parser, raw, self.run_async_check)
            .await
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }
}

impl Debug for FieldBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("required", &self.required)
            .field("binary", &self.binary)
            .field("run_async_check", &self.run_async_check)
            .field("parser", &self.parser)
            .finish()
    }
}

impl FormEngine {
    pub fn register(
        &self,
        name: impl Into<FieldKey>,
        options: RegisterOptions,
    ) -> FormResult<FieldBinding> {
        let name = name.into();
        let parser = options.resolve_parser();
        write_lock(&self.runtime, "installing field parser")?
            .parsers
            .insert(name.clone(), parser.clone());

        let (was_required, current, has_error) = {
            let state = read_lock(&self.state, "reading field for registration")?;
            (
                state.is_required(name.as_str()),
                state.value.get(name.as_str()).cloned(),
                state.has_error(name.as_str()),
            )
        };

        if options.required && !was_required {
            tracing::debug!(form = %self.id, field = %name, "field marked required");
            self.dispatch(FormAction::required([(name.clone(), true)]))?;
        }

        if !options.required && was_required {
            tracing::debug!(form = %self.id, field = %name, "field no longer required");
            self.dispatch(FormAction::required([(name.clone(), false)]))?;
            let is_empty = current.as_ref().is_none_or(FieldValue::is_empty_text);
            if is_empty && has_error {
                self.clear_errors(name.clone())?;
            }
        }

        let value = current
            .filter(|value| !value.is_null())
            .unwrap_or_else(FieldValue::empty_text);
        Ok(FieldBinding {
            name,
            value,
            required: options.required,
            binary: options.binary,
            run_async_check: options.run_async_check,
            parser,
            engine: self.clone(),
        })
    }
}
