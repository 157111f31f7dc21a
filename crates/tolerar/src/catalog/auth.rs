//! Authentication group: login attempts, validation, remember-me, and
//! password recovery.

use super::registration::{
    confirm_password, first_name, fresh_email, last_name, register_button, register_link,
};
use super::{any_of_ci, email_field, error_summary, password_field, url_with};
use crate::assertion::{Expectation, Matcher, Observation};
use crate::locator::CandidateSet;
use crate::scenario::{InputValue, Scenario, StepBuilder};

/// Group name
pub const GROUP: &str = "auth";

/// Header "Log in" link
#[must_use]
pub fn login_link() -> CandidateSet {
    CandidateSet::css("log in link", &["a[href=\"/login\"]", ".ico-login"])
}

/// Login form submit button
#[must_use]
pub fn login_button() -> CandidateSet {
    CandidateSet::css("log in button", &["input[value=\"Log in\"]", ".login-button"])
}

/// "Remember me?" checkbox
#[must_use]
pub fn remember_me() -> CandidateSet {
    CandidateSet::css(
        "remember me",
        &["input[name=\"RememberMe\"][type=\"checkbox\"]", "#RememberMe"],
    )
}

/// Header link to the signed-in customer's account
#[must_use]
pub fn account_link() -> CandidateSet {
    CandidateSet::css("account link", &["a.account", "a[href=\"/customer/info\"]"])
}

/// Header "Log out" link
#[must_use]
pub fn logout_link() -> CandidateSet {
    CandidateSet::css("log out link", &["a[href=\"/logout\"]", ".ico-logout"])
}

const PASSWORD: &str = "Password123!";
const ACCOUNT_EMAIL: &str = "account_email";

fn open_login<B: StepBuilder>(builder: B) -> B {
    builder.click("open login", login_link())
}

fn submit_credentials<B: StepBuilder>(
    builder: B,
    email: impl Into<InputValue>,
    password: &str,
) -> B {
    builder
        .fill("enter email", email_field(), email)
        .fill("enter password", password_field(), password)
        .click("submit login", login_button())
}

/// Register a throwaway account and sign out again, leaving its email in
/// the `account_email` variable
fn register_account<B: StepBuilder>(builder: B) -> B {
    builder
        .click("open registration", register_link())
        .fill("enter first name", first_name(), "John")
        .fill("enter last name", last_name(), "Doe")
        .fill("enter email", email_field(), fresh_email())
        .capture(
            "remember email",
            ACCOUNT_EMAIL,
            Observation::Value(email_field()),
        )
        .fill("enter password", password_field(), PASSWORD)
        .fill("confirm password", confirm_password(), PASSWORD)
        .click("submit registration", register_button())
        .expect(
            "account created",
            Expectation::url_matches(url_with("/registerresult")),
        )
        // registering signs the customer in on most stores
        .try_click("log out", logout_link())
}

/// A freshly registered account can sign in
#[must_use]
pub fn valid_login() -> Scenario {
    let builder = register_account(Scenario::builder("valid user login", GROUP));
    let builder = open_login(builder)
        .expect("on login page", Expectation::url_matches(url_with("/login")));
    let email = InputValue::Variable(ACCOUNT_EMAIL.into());
    submit_credentials(builder, email, PASSWORD)
        .expect(
            "left login page",
            Expectation::new(Observation::Url, Matcher::NotMatches(url_with("/login"))),
        )
        .expect("signed in", Expectation::visible(account_link()))
        .build()
}

/// Unknown credentials are rejected and the user stays on the login page
#[must_use]
pub fn invalid_credentials() -> Scenario {
    let builder = open_login(Scenario::builder("login with invalid credentials", GROUP));
    submit_credentials(builder, "nonexistent@example.com", "wrongpassword")
        .expect("error summary shown", Expectation::visible(error_summary()))
        .expect(
            "login reported unsuccessful",
            Expectation::text_matches(error_summary(), any_of_ci(&["unsuccessful"])),
        )
        .expect("still on login page", Expectation::url_matches(url_with("/login")))
        .build()
}

/// Submitting nothing keeps the form on screen
#[must_use]
pub fn empty_fields() -> Scenario {
    open_login(Scenario::builder("login with empty fields", GROUP))
        .click("submit empty form", login_button())
        .expect("still on login page", Expectation::url_matches(url_with("/login")))
        .expect("email field shown", Expectation::visible(email_field()))
        .expect("password field shown", Expectation::visible(password_field()))
        .build()
}

/// The remember-me checkbox keeps its state across a login attempt
#[must_use]
pub fn remember_me_checkbox() -> Scenario {
    open_login(Scenario::builder("remember me functionality", GROUP))
        .fill("enter email", email_field(), "test@example.com")
        .fill("enter password", password_field(), "password123")
        .check("tick remember me", remember_me(), true)
        .click("submit login", login_button())
        .expect("remember me still ticked", Expectation::checked(remember_me(), true))
        .build()
}

/// The forgot-password link leads to a working recovery form
#[must_use]
pub fn password_recovery() -> Scenario {
    let forgot = CandidateSet::css(
        "forgot password link",
        &["a[href=\"/passwordrecovery\"]", ".forgot-password a"],
    );
    let recover = CandidateSet::css(
        "recover button",
        &["input[value=\"Recover\"]", ".password-recovery-button"],
    );

    open_login(Scenario::builder("password recovery navigation", GROUP))
        .click("open password recovery", forgot)
        .expect(
            "on recovery page",
            Expectation::url_matches(url_with("/passwordrecovery")),
        )
        .expect("email field shown", Expectation::visible(email_field()))
        .expect("recover button shown", Expectation::visible(recover.clone()))
        .fill("enter email", email_field(), "test@example.com")
        .click("request recovery", recover)
        .expect(
            "still in recovery flow",
            Expectation::url_contains("passwordrecovery"),
        )
        .build()
}

/// A malformed email produces a validation message
#[must_use]
pub fn form_validation() -> Scenario {
    let field_error = CandidateSet::css("email validation", &[".field-validation-error"]);
    let builder = open_login(Scenario::builder("login form validation", GROUP));
    submit_credentials(builder, "invalid-email", "somepassword")
        .expect_any(
            "validation reported",
            vec![
                Expectation::visible(field_error),
                Expectation::visible(error_summary()),
            ],
        )
        .build()
}

/// Every authentication scenario
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        valid_login(),
        invalid_credentials(),
        empty_fields(),
        remember_me_checkbox(),
        password_recovery(),
        form_validation(),
    ]
}
