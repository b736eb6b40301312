use std::cell::Cell;
use std::sync::{Arc, Mutex};

use formwork::prelude::*;
use futures::executor::block_on;

struct BrowserSubmit {
    prevented: Cell<bool>,
}

impl SubmitEvent for BrowserSubmit {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}

fn signup_config() -> FormConfig {
    FormConfig::new()
        .validator("email", |values: &FormValues, _: bool| -> Option<String> {
            match values.text("email").map(str::trim) {
                None | Some("") => Some("Email is required".to_string()),
                Some(email) if !email.contains('@') => Some("Email is invalid".to_string()),
                Some(_) => None,
            }
        })
        .validator("age", |values: &FormValues, _: bool| -> Option<String> {
            match values.number("age") {
                Some(age) if age >= 18.0 => None,
                Some(age) if !age.is_nan() => Some("You must be an adult".to_string()),
                _ => Some("Age must be a number".to_string()),
            }
        })
}

#[test]
fn signup_form_blocks_then_submits() {
    let engine = FormEngine::new(signup_config());
    let email = engine
        .register("email", RegisterOptions::new().required(true))
        .expect("register email");
    let age = engine
        .register(
            "age",
            RegisterOptions::new().required(true).parse_as_int(true),
        )
        .expect("register age");
    assert!(engine.is_invalid().expect("invalid"));

    let submitted = Arc::new(Mutex::new(Vec::new()));
    let handler = {
        let submitted = submitted.clone();
        engine.handle_on_submit(move |values: FormValues, _event: &BrowserSubmit| {
            submitted.lock().expect("submitted lock").push(values);
        })
    };

    let event = BrowserSubmit {
        prevented: Cell::new(false),
    };
    let outcome = block_on(handler.handle(&event)).expect("first submit");
    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert!(event.prevented.get());
    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(
        snapshot.error.get("email").cloned().flatten().as_deref(),
        Some("Email is required")
    );
    assert_eq!(
        snapshot.error.get("age").cloned().flatten().as_deref(),
        Some("Age must be a number")
    );

    block_on(email.on_change(&ChangeEvent::with_value("ada@example.com"))).expect("email change");
    block_on(age.on_change(&ChangeEvent::with_value("17"))).expect("age change");
    assert_eq!(
        engine.field_error("age").expect("error").as_deref(),
        Some("You must be an adult")
    );
    block_on(age.on_change(&ChangeEvent::with_value("36"))).expect("age change");
    assert!(!engine.is_invalid().expect("invalid"));

    let outcome = block_on(handler.handle(&event)).expect("second submit");
    assert!(outcome.is_submitted());

    let submitted = submitted.lock().expect("submitted lock");
    assert_eq!(
        submitted.as_slice(),
        [FormValues::new()
            .with("age", 36_i64)
            .with("email", "ada@example.com")]
    );
}
