//! Registration group.
//!
//! The valid-registration scenario takes its email as an [`InputValue`], so
//! callers can run it with a uniquified address (the default) or force a
//! fixed one to exercise the duplicate-account path.

use super::{any_of_ci, email_field, field_error, password_field, url_with};
use crate::assertion::{Expectation, Matcher, Observation};
use crate::locator::CandidateSet;
use crate::scenario::{InputValue, Scenario, StepBuilder};

/// Group name
pub const GROUP: &str = "registration";

const PASSWORD: &str = "Password123!";

/// Header "Register" link
#[must_use]
pub fn register_link() -> CandidateSet {
    CandidateSet::css("register link", &["a[href=\"/register\"]", ".ico-register"])
}

/// Registration form submit button
#[must_use]
pub fn register_button() -> CandidateSet {
    CandidateSet::css("register button", &["input[value=\"Register\"]", "#register-button"])
}

/// Male gender radio
#[must_use]
pub fn gender_male() -> CandidateSet {
    CandidateSet::css("gender male", &["input[value=\"M\"]", "#gender-male"])
}

/// First name input
#[must_use]
pub fn first_name() -> CandidateSet {
    CandidateSet::css("first name", &["input[name=\"FirstName\"]", "#FirstName"])
}

/// Last name input
#[must_use]
pub fn last_name() -> CandidateSet {
    CandidateSet::css("last name", &["input[name=\"LastName\"]", "#LastName"])
}

/// Confirm-password input
#[must_use]
pub fn confirm_password() -> CandidateSet {
    CandidateSet::css(
        "confirm password",
        &["input[name=\"ConfirmPassword\"]", "#ConfirmPassword"],
    )
}

/// Registration result panel
#[must_use]
pub fn result_panel() -> CandidateSet {
    CandidateSet::css("registration result", &[".result", ".registration-result-page .page-body"])
}

/// Default address for a fresh account
#[must_use]
pub fn fresh_email() -> InputValue {
    InputValue::unique_email("john.doe", "example.com")
}

struct Form {
    gender: bool,
    first_name: Option<&'static str>,
    email: InputValue,
    confirm: &'static str,
}

fn fill_form<B: StepBuilder>(builder: B, form: Form) -> B {
    let mut builder = builder
        .click("open registration", register_link())
        .expect("on registration page", Expectation::url_matches(url_with("/register")));
    if form.gender {
        builder = builder.check("choose gender", gender_male(), true);
    }
    if let Some(name) = form.first_name {
        builder = builder.fill("enter first name", first_name(), name);
    }
    builder
        .fill("enter last name", last_name(), "Doe")
        .fill("enter email", email_field(), form.email)
        .fill("enter password", password_field(), PASSWORD)
        .fill("confirm password", confirm_password(), form.confirm)
        .click("submit registration", register_button())
}

fn rejected<B: StepBuilder>(builder: B, message: Expectation) -> B {
    builder
        .expect("field error shown", Expectation::visible(field_error()))
        .expect("error explains the problem", message)
        .expect(
            "still on registration page",
            Expectation::url_matches(url_with("/register")),
        )
}

/// Register with the given email and expect the success page
#[must_use]
pub fn valid_registration_with(email: impl Into<InputValue>) -> Scenario {
    let form = Form {
        gender: true,
        first_name: Some("John"),
        email: email.into(),
        confirm: PASSWORD,
    };
    fill_form(Scenario::builder("valid user registration", GROUP), form)
        .expect(
            "email not already registered",
            Expectation::new(
                Observation::BodyText,
                Matcher::NotMatches(any_of_ci(&["already exists"])),
            ),
        )
        .expect(
            "on result page",
            Expectation::url_matches(url_with("/registerresult")),
        )
        .expect(
            "registration confirmed",
            Expectation::text_contains(result_panel(), "Your registration completed"),
        )
        .build()
}

/// Register a fresh, uniquified account
#[must_use]
pub fn valid_registration() -> Scenario {
    valid_registration_with(fresh_email())
}

/// A missing first name blocks registration
#[must_use]
pub fn missing_first_name() -> Scenario {
    let form = Form {
        gender: false,
        first_name: None,
        email: InputValue::unique_email("test", "example.com"),
        confirm: PASSWORD,
    };
    let builder = fill_form(
        Scenario::builder("registration with missing required fields", GROUP),
        form,
    );
    rejected(
        builder,
        Expectation::text_contains(field_error(), "First name is required"),
    )
    .build()
}

/// Different confirm password blocks registration
#[must_use]
pub fn mismatched_passwords() -> Scenario {
    let form = Form {
        gender: true,
        first_name: Some("John"),
        email: fresh_email(),
        confirm: "DifferentPassword!",
    };
    let builder = fill_form(
        Scenario::builder("registration with mismatched passwords", GROUP),
        form,
    );
    rejected(
        builder,
        Expectation::text_matches(field_error(), any_of_ci(&["password"])),
    )
    .build()
}

/// A malformed email blocks registration
#[must_use]
pub fn invalid_email_format() -> Scenario {
    let form = Form {
        gender: true,
        first_name: Some("John"),
        email: InputValue::literal("invalid-email-format"),
        confirm: PASSWORD,
    };
    let builder = fill_form(
        Scenario::builder("registration with invalid email format", GROUP),
        form,
    );
    rejected(
        builder,
        Expectation::text_matches(field_error(), any_of_ci(&["email"])),
    )
    .build()
}

/// Every registration scenario
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        valid_registration(),
        missing_first_name(),
        mismatched_passwords(),
        invalid_email_format(),
    ]
}
