use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::engine::{FormError, FormResult};
use super::model::FormModel;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

impl PartialEq<str> for FieldKey {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FieldKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A raw or parsed form value.
///
/// An unset ("undefined") slot is not a variant: every place a value may be
/// unset holds an `Option<FieldValue>` instead.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    Decimal(Decimal),
}

impl FieldValue {
    pub fn empty_text() -> Self {
        Self::Text(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            Self::Decimal(value) => value.to_f64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(value) if value.is_nan())
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// Host-style truthiness: null, `false`, zero, NaN and empty text are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Decimal(value) => !value.is_zero(),
            Self::Text(text) => !text.is_empty(),
            Self::List(_) => true,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

/// Conversion into a value slot. `None` stands for an unset field.
pub trait IntoFieldValue {
    fn into_field_value(self) -> Option<FieldValue>;
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(self)
    }
}

impl IntoFieldValue for &FieldValue {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(self.clone())
    }
}

impl<T> IntoFieldValue for Option<T>
where
    T: IntoFieldValue,
{
    fn into_field_value(self) -> Option<FieldValue> {
        self.and_then(IntoFieldValue::into_field_value)
    }
}

macro_rules! into_field_value_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoFieldValue for $ty {
                fn into_field_value(self) -> Option<FieldValue> {
                    Some(FieldValue::from(self))
                }
            }
        )*
    };
}

into_field_value_via_from!(&str, String, bool, i32, i64, f64, Decimal);

impl IntoFieldValue for &String {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.clone()))
    }
}

impl<T> IntoFieldValue for Vec<T>
where
    T: IntoFieldValue,
{
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::List(
            self.into_iter()
                .map(|item| item.into_field_value().unwrap_or(FieldValue::Null))
                .collect(),
        ))
    }
}

/// Decoding of a single submitted field into a typed model field.
pub trait FromFieldValue: Sized {
    fn expected() -> &'static str;

    fn from_field_value(value: &FieldValue) -> Option<Self>;

    /// Value used when the field is unset; `None` marks the field as mandatory.
    fn from_missing() -> Option<Self> {
        None
    }
}

impl FromFieldValue for String {
    fn expected() -> &'static str {
        "text"
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromFieldValue for bool {
    fn expected() -> &'static str {
        "bool"
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromFieldValue for i64 {
    fn expected() -> &'static str {
        "integer"
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(value) => Some(*value),
            FieldValue::Number(value) if value.fract() == 0.0 => value.to_i64(),
            FieldValue::Decimal(value) if value.fract().is_zero() => value.to_i64(),
            _ => None,
        }
    }
}

impl FromFieldValue for f64 {
    fn expected() -> &'static str {
        "number"
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromFieldValue for Decimal {
    fn expected() -> &'static str {
        "decimal"
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Decimal(value) => Some(*value),
            FieldValue::Int(value) => Some(Decimal::from(*value)),
            FieldValue::Number(value) => Decimal::try_from(*value).ok(),
            FieldValue::Text(text) => Decimal::from_str(text.trim()).ok(),
            _ => None,
        }
    }
}

impl<T> FromFieldValue for Option<T>
where
    T: FromFieldValue,
{
    fn expected() -> &'static str {
        T::expected()
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_field_value(value).map(Some)
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}

/// Ordered mapping of field names to value slots.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FormValues(BTreeMap<FieldKey, Option<FieldValue>>);

impl FormValues {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<FieldKey>, value: impl IntoFieldValue) {
        self.0.insert(key.into(), value.into_field_value());
    }

    pub fn with(mut self, key: impl Into<FieldKey>, value: impl IntoFieldValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Keeps the key but marks the slot as unset.
    pub fn unset(&mut self, key: impl Into<FieldKey>) {
        self.0.insert(key.into(), None);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key).and_then(Option::as_ref)
    }

    pub fn slot(&self, key: &str) -> Option<&Option<FieldValue>> {
        self.0.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_bool)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn is_undefined(&self, key: &str) -> bool {
        self.get(key).is_none()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &Option<FieldValue>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every slot of `payload` replaces the slot of the same key.
    pub fn merge(&mut self, payload: FormValues) {
        self.0.extend(payload.0);
    }

    pub fn overlay(&self, top: &FormValues) -> FormValues {
        let mut merged = self.clone();
        merged
            .0
            .extend(top.0.iter().map(|(key, value)| (key.clone(), value.clone())));
        merged
    }

    pub fn decode_field<T>(&self, key: &str) -> FormResult<T>
    where
        T: FromFieldValue,
    {
        match self.get(key) {
            None => T::from_missing().ok_or_else(|| FormError::MissingField {
                field: FieldKey::new(key),
            }),
            Some(value) => T::from_field_value(value).ok_or_else(|| FormError::FieldType {
                field: FieldKey::new(key),
                expected: T::expected(),
            }),
        }
    }

    pub fn decode<M>(&self) -> FormResult<M>
    where
        M: FormModel,
    {
        M::from_values(self)
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<FieldKey>,
    V: IntoFieldValue,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into_field_value()))
                .collect(),
        )
    }
}

impl IntoIterator for FormValues {
    type Item = (FieldKey, Option<FieldValue>);
    type IntoIter = std::collections::btree_map::IntoIter<FieldKey, Option<FieldValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a FieldKey, &'a Option<FieldValue>);
    type IntoIter = std::collections::btree_map::Iter<'a, FieldKey, Option<FieldValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
