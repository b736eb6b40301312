pub use crate::form::{
    ChangeEvent, FieldBinding, FieldKey, FieldValue, FormConfig, FormEngine, FormError,
    FormModel, FormResult, FormValues, Parser, RegisterOptions, SubmitEvent, SubmitOutcome,
    ValidatorFailure,
};
