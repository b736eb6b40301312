mod binding;
mod config;
mod engine;
mod model;
mod state;
mod submit;
mod validation;
mod value;


pub use binding::{ChangeEvent, FieldBinding, RegisterOptions};
pub use config::FormConfig;
pub use engine::{FieldSelection, FormEngine, FormError, FormId, FormResult, FormSnapshot};
pub use formwork_derive::FormModel;
pub use model::FormModel;
pub use state::{ActionKind, ErrorMap, FormAction, FormState, RawAction, RequiredMap, reduce};
pub use submit::{SubmitEvent, SubmitHandler, SubmitOutcome, SubmitState};
pub use validation::{
    AsyncFieldValidator, BoxedValidationFuture, FieldValidator, Parser, ValidationResult,
    ValidatorFailure,
};
pub use value::{FieldKey, FieldValue, FormValues, FromFieldValue, IntoFieldValue};
