//! Scripted copy of the demo webshop for end-to-end tests.
//!
//! Markup follows the live site closely enough for the catalog's candidate
//! sets to resolve. A few elements deliberately answer only to a fallback
//! selector, and a few optional affordances are missing, so fallback chains
//! and skips get exercised.

#![allow(dead_code)]

use tolerar::config::RunnerConfig;
use tolerar::mock::{encode_component, ClickEffect, MockElement, MockPage, MockSite, Store};
use tolerar::runner::ScenarioRunner;

pub const ORIGIN: &str = "https://demowebshop.test";

pub const SEEDED_EMAIL: &str = "known@example.com";
pub const SEEDED_PASSWORD: &str = "known-password";

struct Product {
    name: &'static str,
    path: &'static str,
    price: &'static str,
}

static PRODUCTS: [Product; 3] = [
    Product {
        name: "14.1-inch Laptop",
        path: "/141-inch-laptop",
        price: "1590.00",
    },
    Product {
        name: "Build your own computer",
        path: "/build-your-own-computer",
        price: "1200.00",
    },
    Product {
        name: "Desktop PC with CDRW",
        path: "/desktop-pc-with-cdrw",
        price: "500.00",
    },
];

/// Runner with bounds short enough for an in-memory site
pub fn fast_runner() -> ScenarioRunner {
    ScenarioRunner::new(
        RunnerConfig::new()
            .with_base_url(format!("{ORIGIN}/"))
            .with_element_timeout(150)
            .with_optional_timeout(40)
            .with_idle_timeout(300)
            .with_quiet_window(0)
            .with_poll_interval(5),
    )
}

/// The scripted webshop with one seeded account
pub fn webshop() -> MockSite {
    let site = MockSite::new(ORIGIN)
        .route("/", |ctx| {
            page(ctx.session, "Welcome to our store").body("Featured products")
        })
        .route("/search", |ctx| search_page(ctx.param("q"), ctx.session))
        .route("/141-inch-laptop", |ctx| product_page(&PRODUCTS[0], ctx.session))
        .route("/cart", |ctx| cart_page(ctx.session))
        .route("/login", |ctx| login_page(ctx.session))
        .route("/register", |ctx| register_page(ctx.session))
        .route("/registerresult/1", |ctx| {
            page(ctx.session, "Register").element(
                MockElement::new("div")
                    .matching(".result")
                    .text("Your registration completed"),
            )
        });
    site.with_shared(|shared| {
        shared.set(account_key(SEEDED_EMAIL), SEEDED_PASSWORD);
    });
    site
}

fn account_key(email: &str) -> String {
    format!("account:{}", email.to_lowercase())
}

// =============================================================================
// LAYOUT
// =============================================================================

fn account_links(session: &Store) -> Vec<MockElement> {
    match session.get("customer") {
        Some(email) => vec![
            MockElement::new("a")
                .matching("a.account")
                .text(email.to_string()),
            MockElement::new("a")
                .matching(".ico-logout")
                .text("Log out")
                .on_click(|ctx| {
                    let _ = ctx.session.remove("customer");
                    ClickEffect::Navigate("/".into())
                }),
        ],
        None => vec![
            MockElement::new("a")
                .matching("a[href=\"/register\"]")
                .matching(".ico-register")
                .text("Register")
                .on_click(|_| ClickEffect::Navigate("/register".into())),
            MockElement::new("a")
                .matching("a[href=\"/login\"]")
                .matching(".ico-login")
                .text("Log in")
                .on_click(|_| ClickEffect::Navigate("/login".into())),
        ],
    }
}

fn header(session: &Store) -> Vec<MockElement> {
    let mut links = account_links(session);
    links.extend([
        MockElement::new("a")
            .matching("a[href=\"/cart\"]")
            .matching(".ico-cart")
            .text("Shopping cart")
            .on_click(|_| ClickEffect::Navigate("/cart".into())),
        MockElement::new("span")
            .matching(".cart-qty")
            .text(format!("({})", session.number("cart_qty"))),
        // The header search box only answers to its fallback selector.
        MockElement::new("input")
            .matching("input[name=\"q\"]")
            .named("q"),
        MockElement::new("input")
            .matching("input[value=\"Search\"]")
            .matching(".search-box-button")
            .on_click(|ctx| {
                let term = encode_component(ctx.field("q"));
                ClickEffect::Navigate(format!("/search?q={term}"))
            }),
    ]);
    links
}

fn page(session: &Store, title: &str) -> MockPage {
    MockPage::new()
        .elements(header(session))
        .element(MockElement::new("h1").matching("h1").text(title))
}

// =============================================================================
// PAGES
// =============================================================================

fn search_page(term: &str, session: &Store) -> MockPage {
    let needle = term.to_lowercase();
    let hits: Vec<&Product> = if needle.is_empty() {
        Vec::new()
    } else {
        PRODUCTS
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    };

    let mut page = page(session, "Search").element(
        MockElement::new("input")
            .matching("input[name=\"Q\"]")
            .matching("#Q")
            .named("Q")
            .value(term),
    );
    if hits.is_empty() {
        page = page.body("No products were found that matched your criteria.");
    }
    for product in hits {
        page = page.elements([
            MockElement::new("div")
                .matching(".product-item")
                .text(product.name),
            MockElement::new("h2")
                .matching(".product-title")
                .text(product.name),
        ]);
    }
    page
}

fn product_page(product: &'static Product, session: &Store) -> MockPage {
    page(session, product.name).elements([
        MockElement::new("div")
            .matching(".product-name")
            .text(product.name),
        MockElement::new("span").matching(".price").text(product.price),
        MockElement::new("input")
            .matching("input.qty-input")
            .named("EnteredQuantity")
            .value("1"),
        MockElement::new("input")
            .matching("input[value=\"Add to cart\"]")
            .on_click(move |ctx| {
                let qty: i64 = ctx.field("EnteredQuantity").trim().parse().unwrap_or(1);
                let _ = ctx.session.incr("cart_qty", qty);
                if !ctx.session.contains("cart", product.path) {
                    ctx.session.push("cart", product.path);
                }
                ClickEffect::Refresh
            }),
    ])
}

fn cart_page(session: &Store) -> MockPage {
    let items = session.list("cart");
    let mut page = page(session, "Shopping cart");
    if items.is_empty() {
        return page.element(
            MockElement::new("div")
                .matching(".order-summary-content")
                .text("Your Shopping Cart is empty!"),
        );
    }
    page = page.element(
        MockElement::new("div")
            .matching(".shopping-cart-page")
            .text("Shopping cart"),
    );
    for path in items {
        let Some(product) = PRODUCTS.iter().find(|p| p.path == path) else {
            continue;
        };
        page = page.elements([
            MockElement::new("tr")
                .matching(".cart-item")
                .text(product.name),
            MockElement::new("img").matching(".product-picture img"),
            MockElement::new("a").matching("table a").text(product.name),
            MockElement::new("span")
                .matching(".unit-price")
                .text(product.price),
            MockElement::new("input")
                .matching("input.qty-input")
                .value(session.number("cart_qty").to_string()),
        ]);
    }
    page
}

fn login_page(session: &Store) -> MockPage {
    let mut page = page(session, "Welcome, Please Sign In!").elements([
        MockElement::new("input")
            .matching("input[name=\"Email\"]")
            .named("Email"),
        MockElement::new("input")
            .matching("input[name=\"Password\"]")
            .named("Password"),
        MockElement::new("input")
            .matching("input[value=\"Log in\"]")
            .on_click(|ctx| {
                let email = ctx.field("Email").to_string();
                let password = ctx.field("Password").to_string();
                if ctx.shared.get(&account_key(&email)) == Some(password.as_str()) {
                    ctx.session.set("customer", email);
                    let _ = ctx.session.remove("login_error");
                    ClickEffect::Navigate("/".into())
                } else {
                    ctx.session.set("login_error", "true");
                    ClickEffect::Navigate("/login".into())
                }
            }),
    ]);
    if session.flag("login_error") {
        page = page.element(
            MockElement::new("div")
                .matching(".validation-summary-errors")
                .text("Login was unsuccessful. Please correct the errors and try again."),
        );
    }
    page
}

fn register_page(session: &Store) -> MockPage {
    let mut page = page(session, "Register").elements([
        MockElement::new("input")
            .matching("input[value=\"M\"]")
            .matching("#gender-male")
            .named("Gender")
            .checked(false),
        MockElement::new("input")
            .matching("input[name=\"FirstName\"]")
            .named("FirstName"),
        MockElement::new("input")
            .matching("input[name=\"LastName\"]")
            .named("LastName"),
        MockElement::new("input")
            .matching("input[name=\"Email\"]")
            .named("Email"),
        MockElement::new("input")
            .matching("input[name=\"Password\"]")
            .named("Password"),
        MockElement::new("input")
            .matching("input[name=\"ConfirmPassword\"]")
            .named("ConfirmPassword"),
        // Only the fallback id is present on the submit button.
        MockElement::new("input")
            .matching("#register-button")
            .on_click(|ctx| {
                let email = ctx.field("Email").trim().to_string();
                let problem = if ctx.field("FirstName").trim().is_empty() {
                    Some(("field", "First name is required."))
                } else if !email.contains('@') {
                    Some(("field", "Wrong email"))
                } else if ctx.field("Password") != ctx.field("ConfirmPassword") {
                    Some(("field", "The password and confirmation password do not match."))
                } else if ctx.shared.get(&account_key(&email)).is_some() {
                    Some(("summary", "The specified email already exists"))
                } else {
                    None
                };
                match problem {
                    Some((kind, message)) => {
                        ctx.session.set("register_error_kind", kind);
                        ctx.session.set("register_error", message);
                        ClickEffect::Navigate("/register".into())
                    }
                    None => {
                        let password = ctx.field("Password").to_string();
                        ctx.shared.set(account_key(&email), password);
                        ctx.shared.push("registered", email.clone());
                        ctx.session.set("customer", email);
                        let _ = ctx.session.remove("register_error");
                        ClickEffect::Navigate("/registerresult/1".into())
                    }
                }
            }),
    ]);
    if let Some(message) = session.get("register_error") {
        let selector = if session.get("register_error_kind") == Some("summary") {
            ".validation-summary-errors"
        } else {
            ".field-validation-error"
        };
        page = page.element(MockElement::new("span").matching(selector).text(message));
    }
    page
}
