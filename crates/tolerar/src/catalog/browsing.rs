//! Browsing group: categories, listing controls, and product detail pages.

use super::{any_of_ci, product_items, url_with, LAPTOP_PATH};
use crate::assertion::{Comparison, Expectation, Observation, PatternSet};
use crate::driver::OptionChoice;
use crate::locator::{CandidateSet, Selector};
use crate::scenario::{Scenario, StepBuilder};

/// Group name
pub const GROUP: &str = "browsing";

const CATEGORIES: [&str; 4] = ["Books", "Computers", "Electronics", "Jewelry"];

fn link_to(name: &str, href: &str) -> CandidateSet {
    let selector = format!("a[href=\"{href}\"]");
    CandidateSet::css(name, &[selector.as_str()])
}

fn breadcrumb() -> CandidateSet {
    CandidateSet::css("breadcrumb", &[".breadcrumb", ".page-title"])
}

fn product_title_links() -> CandidateSet {
    CandidateSet::css(
        "product title links",
        &[".product-item .product-title a", ".product-title a"],
    )
}

fn product_name() -> CandidateSet {
    CandidateSet::css("product name", &[".product-name h1", ".product-name", "h1"])
}

fn price() -> CandidateSet {
    CandidateSet::css("price", &[".price", ".product-price"])
}

fn specifications() -> CandidateSet {
    CandidateSet::css("specifications", &[".product-specs", ".attributes"])
}

/// Computers, then Notebooks, shows a product listing with breadcrumb
#[must_use]
pub fn category_navigation() -> Scenario {
    Scenario::builder("category navigation", GROUP)
        .click("open computers", link_to("computers link", "/computers"))
        .expect("on computers", Expectation::url_matches(url_with("/computers")))
        .expect("desktops listed", Expectation::visible(link_to("desktops link", "/desktops")))
        .expect("notebooks listed", Expectation::visible(link_to("notebooks link", "/notebooks")))
        .expect(
            "accessories listed",
            Expectation::visible(link_to("accessories link", "/accessories")),
        )
        .click("open notebooks", link_to("notebooks link", "/notebooks"))
        .expect("on notebooks", Expectation::url_matches(url_with("/notebooks")))
        .expect("products listed", Expectation::visible(product_items()))
        .expect(
            "breadcrumb shows notebooks",
            Expectation::text_matches(breadcrumb(), any_of_ci(&["notebooks"])),
        )
        .try_expect(
            "product pictures shown",
            Expectation::visible(CandidateSet::css(
                "product pictures",
                &[".product-item .picture img"],
            )),
        )
        .expect(
            "product titles shown",
            Expectation::visible(CandidateSet::css(
                "product titles",
                &[".product-item .product-title"],
            )),
        )
        .expect(
            "prices shown",
            Expectation::visible(CandidateSet::css("listing prices", &[".product-item .price"])),
        )
        .build()
}

/// Attribute filter, price sort, and page size on the notebooks listing
#[must_use]
pub fn filtering_and_sorting() -> Scenario {
    let filters = CandidateSet::css(
        "attribute filters",
        &[".product-filters", "[data-productfilter]", ".filters"],
    )
    .or(Selector::text("Filter by attributes"));
    let intel = CandidateSet::css("intel filter", &["a[href*=\"specs=6\"]"])
        .or(Selector::css_with_text("a", "Intel"));
    let first_price = CandidateSet::css(
        "first price",
        &[".item-box:nth-of-type(1) .actual-price", ".product-item .price-value"],
    );
    let second_price =
        CandidateSet::css("second price", &[".item-box:nth-of-type(2) .actual-price"]);

    Scenario::builder("product filtering and sorting", GROUP)
        .start("/notebooks")
        .try_expect("attribute filters shown", Expectation::visible(filters))
        .when_present("intel filter offered", intel.clone(), |s| {
            s.click("filter by intel", intel)
                .expect("filter applied", Expectation::url_contains("specs"))
                .expect("products still listed", Expectation::visible(product_items()))
        })
        .select(
            "sort by price ascending",
            super::search::sort_select(),
            OptionChoice::Label("Price: Low to High".into()),
        )
        .try_capture("read first price", "first_price", Observation::Text(first_price))
        .try_expect(
            "second price not lower",
            Expectation::number_vs_captured(second_price, Comparison::Ge, "first_price"),
        )
        .select(
            "four per page",
            super::search::page_size_select(),
            OptionChoice::Label("4".into()),
        )
        .expect(
            "at most four products",
            Expectation::count(product_items(), Comparison::Le, 4.0),
        )
        .build()
}

/// Grid is the default view and list/grid toggle back and forth
#[must_use]
pub fn view_toggle() -> Scenario {
    let view_mode = super::search::view_mode_select();
    Scenario::builder("view toggle grid list", GROUP)
        .start("/notebooks")
        .expect(
            "grid offered first",
            Expectation::text_matches(view_mode.clone(), PatternSet::new(["^Grid"])),
        )
        .select("switch to list", view_mode.clone(), OptionChoice::Label("List".into()))
        .expect(
            "list layout",
            Expectation::visible(CandidateSet::css("list layout", &[".product-list"])),
        )
        .select("switch to grid", view_mode, OptionChoice::Label("Grid".into()))
        .expect(
            "grid layout",
            Expectation::visible(CandidateSet::css("grid layout", &[".product-grid"])),
        )
        .build()
}

/// A product page shows name, picture, price, description, and breadcrumb
#[must_use]
pub fn product_detail() -> Scenario {
    Scenario::builder("product detail page navigation", GROUP)
        .start("/notebooks")
        .click("open first product", product_title_links())
        .expect(
            "on a product slug",
            Expectation::url_matches(PatternSet::new([r"/[a-zA-Z0-9-]+$"])),
        )
        .expect("name shown", Expectation::visible(product_name()))
        .expect(
            "picture shown",
            Expectation::visible(CandidateSet::css("product picture", &[".picture img"])),
        )
        .expect("price shown", Expectation::visible(price()))
        .expect(
            "description shown",
            Expectation::visible(CandidateSet::css(
                "description",
                &[".short-description", ".full-description"],
            )),
        )
        .expect(
            "breadcrumb shown",
            Expectation::visible(CandidateSet::css("breadcrumb", &[".breadcrumb"])),
        )
        .when_present("specifications listed", specifications(), |s| {
            s.expect(
                "specifications titled",
                Expectation::text_matches(specifications(), any_of_ci(&["specification"])),
            )
        })
        .build()
}

/// Specifications list technical attributes
#[must_use]
pub fn specifications_display() -> Scenario {
    Scenario::builder("product specifications display", GROUP)
        .start(LAPTOP_PATH)
        .when_present("specifications listed", specifications(), |s| {
            s.expect(
                "technical details",
                Expectation::text_matches(
                    specifications(),
                    any_of_ci(&["screensize", "cpu", "memory", "hard"]),
                ),
            )
        })
        .expect("name shown", Expectation::visible(product_name()))
        .expect("price shown", Expectation::visible(price()))
        .build()
}

/// The review link opens the review page
#[must_use]
pub fn reviews_navigation() -> Scenario {
    let review_link = CandidateSet::css(
        "review link",
        &["a[href*=\"productreviews\"]", ".product-review-links a"],
    );
    Scenario::builder("product reviews and ratings navigation", GROUP)
        .start(LAPTOP_PATH)
        .when_present("reviews linked", review_link.clone(), |s| {
            s.expect(
                "link mentions reviews",
                Expectation::text_matches(review_link.clone(), any_of_ci(&["review"])),
            )
            .click("open reviews", review_link)
            .expect(
                "on review page",
                Expectation::url_matches(url_with("productreviews")),
            )
            .expect(
                "title mentions reviews",
                Expectation::text_matches(
                    CandidateSet::css("page title", &[".page-title"]),
                    any_of_ci(&["review"]),
                ),
            )
        })
        .build()
}

/// A product tag leads to a tagged listing
#[must_use]
pub fn tags() -> Scenario {
    let tag_link = CandidateSet::css("tag link", &[".product-tags a", ".product-tags-list a"]);
    Scenario::builder("product tags functionality", GROUP)
        .start(LAPTOP_PATH)
        .when_present("tags listed", tag_link.clone(), |s| {
            s.click("open first tag", tag_link)
                .expect("on tag listing", Expectation::url_matches(url_with("producttag")))
                .expect("products listed", Expectation::visible(product_items()))
        })
        .build()
}

/// Each top-level category opens a page titled after it
#[must_use]
pub fn category_hierarchy() -> Scenario {
    let mut builder = Scenario::builder("category hierarchy navigation", GROUP);
    for category in CATEGORIES {
        let link = CandidateSet::new(format!("{category} link"))
            .or(Selector::css_with_text("a", category));
        builder = builder.when_present(&format!("{category} offered"), link.clone(), |s| {
            s.click(&format!("open {category}"), link)
                .expect(
                    &format!("{category} page"),
                    Expectation::text_contains(
                        CandidateSet::css("page title", &[".page-title", "h1"]),
                        category,
                    ),
                )
                .navigate("back home", "/")
        });
    }
    builder.build()
}

/// Every browsing scenario
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        category_navigation(),
        filtering_and_sorting(),
        view_toggle(),
        product_detail(),
        specifications_display(),
        reviews_navigation(),
        tags(),
        category_hierarchy(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Action;

    #[test]
    fn test_hierarchy_visits_every_category() {
        let scenario = category_hierarchy();
        assert_eq!(scenario.steps.len(), CATEGORIES.len());
        for (step, category) in scenario.steps.iter().zip(CATEGORIES) {
            let Action::Branch { probe, present, .. } = &step.action else {
                panic!("expected branch");
            };
            assert_eq!(probe.candidates, vec![Selector::css_with_text("a", category)]);
            assert_eq!(present.len(), 3);
        }
    }

    #[test]
    fn test_link_to_builds_href_selector() {
        let set = link_to("notebooks link", "/notebooks");
        assert_eq!(set.candidates, vec![Selector::css("a[href=\"/notebooks\"]")]);
    }
}
