use super::engine::FormResult;
use super::value::{FieldKey, FormValues};

/// A typed struct that maps field-by-field onto a form's value set.
///
/// Usually derived with `#[derive(FormModel)]`, which also generates a
/// `<Model>Fields` accessor struct returning each field's [`FieldKey`].
pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> Vec<FieldKey>;

    fn to_values(&self) -> FormValues;

    fn from_values(values: &FormValues) -> FormResult<Self>;
}
