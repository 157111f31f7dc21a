//! Scenario catalog for the Tricentis demo webshop.
//!
//! Five groups, each a module with one constructor per scenario and a
//! `scenarios()` that returns the group in declaration order:
//!
//! | group | module |
//! |-------|--------|
//! | `search` | [`search`] |
//! | `cart` | [`cart`] |
//! | `auth` | [`auth`] |
//! | `registration` | [`registration`] |
//! | `browsing` | [`browsing`] |
//!
//! Elements used by more than one group live here. Every candidate set lists
//! the site's current markup first and older or alternative markup after it.

pub mod auth;
pub mod browsing;
pub mod cart;
pub mod registration;
pub mod search;

use crate::assertion::PatternSet;
use crate::locator::CandidateSet;
use crate::scenario::Scenario;

/// Product page used wherever a scenario needs "some product"
pub const LAPTOP_PATH: &str = "/141-inch-laptop";

/// Every scenario, grouped in catalog order
#[must_use]
pub fn all() -> Vec<Scenario> {
    let mut scenarios = search::scenarios();
    scenarios.extend(cart::scenarios());
    scenarios.extend(auth::scenarios());
    scenarios.extend(registration::scenarios());
    scenarios.extend(browsing::scenarios());
    scenarios
}

/// Header search input
#[must_use]
pub fn search_box() -> CandidateSet {
    CandidateSet::css("search box", &["#small-searchterms", "input[name=\"q\"]"])
}

/// Header search button
#[must_use]
pub fn search_button() -> CandidateSet {
    CandidateSet::css("search button", &["input[value=\"Search\"]", ".search-button"])
}

/// Page heading
#[must_use]
pub fn heading() -> CandidateSet {
    CandidateSet::css("page heading", &["h1"])
}

/// Header cart counter, e.g. `(2)`
#[must_use]
pub fn cart_qty() -> CandidateSet {
    CandidateSet::css("cart quantity", &[".cart-qty"])
}

/// Product tiles in listings and search results
#[must_use]
pub fn product_items() -> CandidateSet {
    CandidateSet::css("product items", &[".product-item", ".item-box"])
}

/// Rows of the shopping cart table
#[must_use]
pub fn cart_rows() -> CandidateSet {
    CandidateSet::css("cart rows", &[".cart-item", "tr.cart-item-row"])
}

/// "Add to cart" on a product page
#[must_use]
pub fn add_to_cart_button() -> CandidateSet {
    CandidateSet::css(
        "add to cart button",
        &["input[value=\"Add to cart\"]", ".add-to-cart-button"],
    )
}

/// Email input on login, recovery and registration forms
#[must_use]
pub fn email_field() -> CandidateSet {
    CandidateSet::css("email field", &["input[name=\"Email\"]", "#Email"])
}

/// Password input on login and registration forms
#[must_use]
pub fn password_field() -> CandidateSet {
    CandidateSet::css("password field", &["input[name=\"Password\"]", "#Password"])
}

/// Validation summary or error banner
#[must_use]
pub fn error_summary() -> CandidateSet {
    CandidateSet::css(
        "error summary",
        &[".validation-summary-errors", ".message-error"],
    )
}

/// Inline field validation message
#[must_use]
pub fn field_error() -> CandidateSet {
    CandidateSet::css(
        "field validation error",
        &[".field-validation-error", ".validation-summary-errors"],
    )
}

/// Product price pattern (`1590.00`)
#[must_use]
pub fn price_pattern() -> PatternSet {
    PatternSet::new([r"\d+\.\d{2}"])
}

/// URL pattern for a path fragment
#[must_use]
pub fn url_with(fragment: &str) -> PatternSet {
    PatternSet::new([regex::escape(fragment)])
}

/// Case-insensitive alternatives
#[must_use]
pub fn any_of_ci(patterns: &[&str]) -> PatternSet {
    PatternSet::case_insensitive(patterns.iter().copied())
}
