//! Cart group.
//!
//! Sessions are isolated, so every scenario that needs a filled cart adds
//! the laptop itself through [`with_cart_item`].

use super::{
    add_to_cart_button, any_of_ci, cart_qty, cart_rows, heading, price_pattern, url_with,
    LAPTOP_PATH,
};
use crate::assertion::{Comparison, Expectation, Matcher, Observation, Operand};
use crate::driver::OptionChoice;
use crate::locator::CandidateSet;
use crate::scenario::{Scenario, StepBuilder};

/// Group name
pub const GROUP: &str = "cart";

/// Header link to the cart page
#[must_use]
pub fn cart_link() -> CandidateSet {
    CandidateSet::css("shopping cart link", &["a[href=\"/cart\"]", ".ico-cart"])
}

/// Quantity input (product page and cart rows)
#[must_use]
pub fn qty_input() -> CandidateSet {
    CandidateSet::css(
        "quantity input",
        &[
            "input.qty-input",
            "input[name*=\"quantity\"]",
            "input[name=\"addtocart_31.EnteredQuantity\"]",
        ],
    )
}

/// "Update shopping cart" button
#[must_use]
pub fn update_cart_button() -> CandidateSet {
    CandidateSet::css(
        "update cart button",
        &["input[name=\"updatecart\"]", "input[value*=\"Update\"]", ".update-cart-button"],
    )
}

/// Order total cell
#[must_use]
pub fn cart_total() -> CandidateSet {
    CandidateSet::css("cart total", &[".cart-total"])
}

fn coupon_error() -> CandidateSet {
    CandidateSet::css(
        "coupon message",
        &[".message-error", ".validation-summary-errors"],
    )
}

/// Open the cart, adding the laptop first when the cart is empty
pub fn with_cart_item<B: StepBuilder>(builder: B) -> B {
    builder.navigate("open cart", "/cart").ensure(
        "cart has at least one row",
        Expectation::count(cart_rows(), Comparison::Ge, 1.0),
        |s| {
            s.navigate("open laptop", LAPTOP_PATH)
                .click("add laptop to cart", add_to_cart_button())
                .navigate("back to cart", "/cart")
        },
    )
}

/// Adding a product strictly increases the header cart count
#[must_use]
pub fn add_to_cart() -> Scenario {
    Scenario::builder("add product to cart", GROUP)
        .start(LAPTOP_PATH)
        .expect(
            "quantity defaults to 1",
            Expectation::value_equals(qty_input(), "1"),
        )
        .capture("read cart count", "cart_before", Observation::Text(cart_qty()))
        .click("add to cart", add_to_cart_button())
        .expect(
            "cart count increased",
            Expectation::number_vs_captured(cart_qty(), Comparison::Gt, "cart_before"),
        )
        .build()
}

/// The cart page lists the added product with a price and quantity control
#[must_use]
pub fn view_cart() -> Scenario {
    let page = CandidateSet::css("cart page", &[".shopping-cart-page", ".order-summary-content"]);
    let unit_price = CandidateSet::css("unit price", &[".unit-price", ".product-unit-price"]);
    let picture = CandidateSet::css(
        "product picture",
        &[".product-picture img", ".cart-item .picture img"],
    );
    let product_link = CandidateSet::css("product link", &["table a", ".product-name"]);

    Scenario::builder("view shopping cart", GROUP)
        .start(LAPTOP_PATH)
        .click("add to cart", add_to_cart_button())
        .click("open cart", cart_link())
        .expect("on cart page", Expectation::url_matches(url_with("/cart")))
        .expect("cart contents shown", Expectation::visible(page))
        .expect(
            "at least one row",
            Expectation::count(cart_rows(), Comparison::Ge, 1.0),
        )
        .expect("row visible", Expectation::visible(cart_rows()))
        .try_expect("product picture shown", Expectation::visible(picture))
        .expect("product name linked", Expectation::visible(product_link))
        .expect(
            "unit price formatted",
            Expectation::text_matches(unit_price, price_pattern()),
        )
        .expect("quantity editable", Expectation::visible(qty_input()))
        .build()
}

/// Changing a row quantity and updating keeps the new quantity
#[must_use]
pub fn update_quantities() -> Scenario {
    with_cart_item(Scenario::builder("update cart quantities", GROUP))
        .fill("set quantity to 3", qty_input(), "3")
        .click("update cart", update_cart_button())
        .expect("quantity is 3", Expectation::value_equals(qty_input(), "3"))
        .try_expect(
            "total recalculated",
            Expectation::text_matches(cart_total(), price_pattern()),
        )
        .build()
}

/// Ticking "remove" and updating drops the row
#[must_use]
pub fn remove_items() -> Scenario {
    let remove = CandidateSet::css(
        "remove checkbox",
        &["input[name=\"removefromcart\"]", "input[type=\"checkbox\"]"],
    );
    let summary = CandidateSet::css("cart summary", &[".order-summary-content"]);

    with_cart_item(Scenario::builder("remove items from cart", GROUP))
        .capture("count rows", "rows_before", Observation::Count(cart_rows()))
        .check("tick remove", remove, true)
        .click("update cart", update_cart_button())
        .expect(
            "fewer rows",
            Expectation::new(
                Observation::Count(cart_rows()),
                Matcher::Compare {
                    op: Comparison::Lt,
                    operand: Operand::Variable("rows_before".into()),
                },
            ),
        )
        .try_expect(
            "empty-cart message",
            Expectation::text_matches(summary, any_of_ci(&["shopping cart is empty"])),
        )
        .build()
}

/// An unknown discount code is rejected with a message
#[must_use]
pub fn discount_codes() -> Scenario {
    let section =
        CandidateSet::css("discount box", &[".discount-box .coupon-code", ".discount-box"]);
    let input = CandidateSet::css(
        "discount code input",
        &["input[name=\"discountcouponcode\"]", ".discount-coupon input"],
    );
    let apply = CandidateSet::css(
        "apply coupon button",
        &["input[name=\"applydiscountcouponcode\"]", ".apply-coupon-button"],
    );

    with_cart_item(Scenario::builder("apply discount codes", GROUP))
        .when_present("discount section offered", section, |s| {
            s.fill("enter test code", input, "TESTCODE123")
                .click("apply coupon", apply)
                .try_expect(
                    "code rejected",
                    Expectation::text_matches(coupon_error(), any_of_ci(&["coupon", "discount"])),
                )
        })
        .build()
}

/// An unknown gift card is rejected with a message
#[must_use]
pub fn gift_cards() -> Scenario {
    let section = CandidateSet::css("gift card box", &[".gift-cards", ".giftcard"]);
    let input = CandidateSet::css(
        "gift card input",
        &["input[name=\"giftcardcouponcode\"]", ".gift-card input"],
    );
    let apply = CandidateSet::css(
        "add gift card button",
        &["input[name=\"applygiftcardcouponcode\"]", ".apply-gift-card-button"],
    );

    with_cart_item(Scenario::builder("gift card application", GROUP))
        .when_present("gift card section offered", section, |s| {
            s.fill("enter test card", input, "GIFT123TEST")
                .click("add gift card", apply)
                .try_expect(
                    "card rejected",
                    Expectation::text_matches(coupon_error(), any_of_ci(&["gift card", "coupon"])),
                )
        })
        .build()
}

/// Estimating shipping for a US address shows options or a total
#[must_use]
pub fn estimate_shipping() -> Scenario {
    let section = CandidateSet::css("shipping estimator", &[".estimate-shipping"]);
    let country = CandidateSet::css("country", &["select[name=\"CountryId\"]", "#CountryId"]);
    let state = CandidateSet::css(
        "state",
        &["select[name=\"StateProvinceId\"]", "#StateProvinceId"],
    );
    let zip = CandidateSet::css("zip code", &["input[name=\"ZipPostalCode\"]", "#ZipPostalCode"]);
    let estimate = CandidateSet::css(
        "estimate button",
        &["input[value*=\"Estimate\"]", ".estimate-shipping-button"],
    );
    let options = CandidateSet::css("shipping options", &[".shipping-options", ".shipping-method"]);

    with_cart_item(Scenario::builder("estimate shipping", GROUP))
        .when_present("estimator offered", section, |s| {
            s.select(
                "choose United States",
                country,
                OptionChoice::Label("United States".into()),
            )
            .try_select("choose first state", state, OptionChoice::Index(1))
            .try_fill("enter zip", zip, "10001")
            .click("estimate", estimate)
            .expect("shipping options listed", Expectation::visible(options))
        })
        .build()
}

/// Agreeing to terms and checking out leads to checkout or login
#[must_use]
pub fn checkout_initiation() -> Scenario {
    let terms = CandidateSet::css(
        "terms of service",
        &["input[name=\"termsofservice\"]", "input#termsofservice"],
    );
    let checkout = CandidateSet::css(
        "checkout button",
        &["input[value=\"Checkout\"]", ".checkout-button", "#checkout"],
    );

    with_cart_item(Scenario::builder("checkout process initiation", GROUP))
        .when_present("terms checkbox offered", terms.clone(), |s| {
            s.check("agree to terms", terms, true)
                .click("checkout", checkout)
                .expect_any(
                    "checkout or sign-in page",
                    vec![
                        Expectation::url_matches(url_with("checkout")),
                        Expectation::url_matches(url_with("login")),
                    ],
                )
                .expect(
                    "heading names the page",
                    Expectation::text_matches(
                        heading(),
                        any_of_ci(&["checkout", "sign in", "log ?in"]),
                    ),
                )
        })
        .build()
}

/// Every cart scenario
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        add_to_cart(),
        view_cart(),
        update_quantities(),
        remove_items(),
        discount_codes(),
        gift_cards(),
        estimate_shipping(),
        checkout_initiation(),
    ]
}
