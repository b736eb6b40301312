use formwork::form::{FieldValue, FormModel, FormValues};

#[derive(Clone, Debug, PartialEq, formwork::form::FormModel)]
struct SignupForm {
    email: String,
    age: Option<i64>,
    newsletter: bool,
}

fn main() {
    let fields = SignupForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(SignupForm::field_keys().len(), 3);

    let model = SignupForm {
        email: "a@example.com".to_string(),
        age: None,
        newsletter: true,
    };
    let values = model.to_values();
    assert_eq!(values.text("email"), Some("a@example.com"));
    assert!(values.is_undefined("age"));
    assert_eq!(values.get("newsletter"), Some(&FieldValue::Bool(true)));

    let decoded = values.decode::<SignupForm>().expect("decode model");
    assert_eq!(decoded, model);

    let missing = FormValues::new().with("age", 3);
    assert!(missing.decode::<SignupForm>().is_err());
}
