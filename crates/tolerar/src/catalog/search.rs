//! Search group: header search, advanced search, empty results, sorting,
//! input validation, and result navigation.

use super::{any_of_ci, heading, product_items, search_box, search_button, url_with, LAPTOP_PATH};
use crate::assertion::{Comparison, Expectation, PatternSet};
use crate::driver::OptionChoice;
use crate::locator::CandidateSet;
use crate::scenario::{Scenario, StepBuilder};

/// Group name
pub const GROUP: &str = "search";

/// Search-term input on the `/search` page
#[must_use]
pub fn advanced_term_box() -> CandidateSet {
    CandidateSet::css("search page term", &["input[name=\"Q\"]", "#Q"])
}

/// Sort-by select
#[must_use]
pub fn sort_select() -> CandidateSet {
    CandidateSet::css(
        "sort by",
        &["select#products-orderby", ".products-orderby select"],
    )
}

/// Page-size select
#[must_use]
pub fn page_size_select() -> CandidateSet {
    CandidateSet::css(
        "page size",
        &["select#products-pagesize", ".products-pagesize select"],
    )
}

/// Grid/list select
#[must_use]
pub fn view_mode_select() -> CandidateSet {
    CandidateSet::css(
        "view mode",
        &["select#products-viewmode", ".products-viewmode select"],
    )
}

fn search_for<B: StepBuilder>(builder: B, term: &str) -> B {
    builder
        .fill(&format!("type \"{term}\" into search"), search_box(), term)
        .click("submit search", search_button())
}

/// Header search for "laptop" lands on matching results
#[must_use]
pub fn basic_product_search() -> Scenario {
    let titles = CandidateSet::css("product titles", &[".product-title", ".product-item .title"]);
    let builder = Scenario::builder("basic product search", GROUP);
    search_for(builder, "laptop")
        .expect(
            "results url carries the term",
            Expectation::url_matches(PatternSet::new([r"search.*q=laptop"])),
        )
        .expect(
            "heading mentions search",
            Expectation::text_matches(heading(), any_of_ci(&["search"])),
        )
        .when_present("results listed", product_items(), |s| {
            s.expect("first result visible", Expectation::visible(product_items()))
                .expect(
                    "first title mentions laptop",
                    Expectation::text_matches(titles, any_of_ci(&["laptop"])),
                )
        })
        .expect("sort options shown", Expectation::visible(sort_select()))
        .build()
}

/// Advanced options appear when the advanced checkbox is ticked
#[must_use]
pub fn advanced_search_options() -> Scenario {
    let advanced =
        CandidateSet::css("advanced search checkbox", &["input[name=\"advs\"]", "input#advs"]);
    let category = CandidateSet::css("category filter", &["select[name=\"cid\"]", "select#cid"]);
    let manufacturer =
        CandidateSet::css("manufacturer filter", &["select[name=\"mid\"]", "select#mid"]);
    let price_from = CandidateSet::css("price from", &["input[name=\"pf\"]", "input#pf"]);
    let submit = CandidateSet::css(
        "search page button",
        &["input.search-button", "input[value=\"Search\"]"],
    );

    Scenario::builder("advanced search options", GROUP)
        .start("/search")
        .when_present("advanced search offered", advanced.clone(), |s| {
            s.check("enable advanced search", advanced, true)
                .expect_any(
                    "advanced filters appear",
                    vec![
                        Expectation::visible(category.clone()),
                        Expectation::visible(manufacturer),
                        Expectation::visible(price_from),
                    ],
                )
                .try_select("pick first category", category, OptionChoice::Index(1))
                .fill("enter term", advanced_term_box(), "computer")
                .click("submit advanced search", submit)
                .expect("still on search", Expectation::url_matches(url_with("search")))
        })
        .build()
}

/// A term with no matches shows a "no results" message and keeps the layout
#[must_use]
pub fn empty_search_results() -> Scenario {
    let builder = Scenario::builder("empty search results", GROUP);
    search_for(builder, "nonexistentproduct123xyz")
        .expect("on search page", Expectation::url_matches(url_with("search")))
        .expect(
            "no-results message",
            Expectation::body_matches(any_of_ci(&["no.*result", "no.*product", "not.*found"])),
        )
        .expect("heading still visible", Expectation::visible(heading()))
        .expect(
            "search input still visible",
            Expectation::visible(advanced_term_box()),
        )
        .build()
}

/// Sort, page size, and view mode keep the search criteria
#[must_use]
pub fn sorting_and_display() -> Scenario {
    Scenario::builder("search result sorting and display", GROUP)
        .start("/search?q=computer")
        .when_present("results listed", product_items(), |s| {
            s.try_select(
                "sort by price ascending",
                sort_select(),
                OptionChoice::Label("Price: Low to High".into()),
            )
            .try_expect("url reflects sorting", Expectation::url_contains("orderby"))
            .try_select(
                "four per page",
                page_size_select(),
                OptionChoice::Label("4".into()),
            )
            .try_expect(
                "at most four products",
                Expectation::count(product_items(), Comparison::Le, 4.0),
            )
            .try_select("list view", view_mode_select(), OptionChoice::Label("List".into()))
            .try_select("grid view", view_mode_select(), OptionChoice::Label("Grid".into()))
            .try_expect("term kept", Expectation::url_contains("computer"))
        })
        .build()
}

/// Empty, special-character, and very long terms never break the page
#[must_use]
pub fn input_validation() -> Scenario {
    let long_term = "a".repeat(100);
    let body = CandidateSet::css("page body", &["body"]);
    let builder = Scenario::builder("search input validation", GROUP);
    let builder = search_for(builder, "").expect(
        "empty search handled",
        Expectation::url_matches(PatternSet::new(["search", "home", "/$"])),
    );
    let builder = search_for(builder.navigate("back home", "/"), "!@#$%^&*()")
        .expect("heading still visible", Expectation::visible(heading()));
    search_for(builder.navigate("back home", "/"), &long_term)
        .expect("page still renders", Expectation::visible(body))
        .build()
}

/// The header search works from the home, category, and product pages
#[must_use]
pub fn search_from_different_pages() -> Scenario {
    let origins = [("/", "laptop"), ("/computers", "desktop"), (LAPTOP_PATH, "accessories")];
    let mut builder = Scenario::builder("search from different pages", GROUP);
    for (page, term) in origins {
        builder = search_for(builder.navigate(&format!("open {page}"), page), term).expect(
            &format!("results for {term}"),
            Expectation::url_matches(PatternSet::new([format!("search.*{term}")])),
        );
    }
    builder.build()
}

/// Open a result, then come back to the results with history back
#[must_use]
pub fn results_navigation() -> Scenario {
    let result_links = CandidateSet::css(
        "result links",
        &[".product-item .product-title a", ".item-box .title a"],
    );
    let product_name = CandidateSet::css("product name", &[".product-name", ".product-details"]);

    Scenario::builder("search results navigation", GROUP)
        .start("/search?q=computer")
        .when_present("results listed", result_links.clone(), |s| {
            s.click("open first result", result_links)
                .expect("product page shown", Expectation::visible(product_name))
                .go_back("back to results")
                .expect("on search again", Expectation::url_matches(url_with("search")))
                .expect("results visible again", Expectation::visible(product_items()))
        })
        .build()
}

/// Use autocomplete when the site offers it, otherwise finish the term by hand
#[must_use]
pub fn autocomplete() -> Scenario {
    let suggestions = CandidateSet::css(
        "search suggestions",
        &[
            ".ui-autocomplete li",
            ".search-suggestions li",
            ".dropdown-menu li",
            ".suggestion-item",
        ],
    );
    let product_name = CandidateSet::css("product name", &[".product-name", ".product-details"]);

    Scenario::builder("search suggestions and autocomplete", GROUP)
        .fill("type partial term", search_box(), "comp")
        .branch(
            "suggestions offered",
            suggestions.clone(),
            |s| {
                s.click("pick first suggestion", suggestions).expect_any(
                    "suggestion opened results or a product",
                    vec![
                        Expectation::url_matches(url_with("search")),
                        Expectation::visible(product_name),
                    ],
                )
            },
            |s| {
                s.fill("finish the term", search_box(), "computer")
                    .click("submit search", search_button())
                    .expect(
                        "results for computer",
                        Expectation::url_matches(PatternSet::new([r"search.*computer"])),
                    )
            },
        )
        .build()
}

/// Every search scenario
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        basic_product_search(),
        advanced_search_options(),
        empty_search_results(),
        sorting_and_display(),
        input_validation(),
        search_from_different_pages(),
        results_navigation(),
        autocomplete(),
    ]
}
