//! Selector table for the target catalog
//!
//! Every site-specific detail about page structure is confined to this
//! module. The rest of the pipeline works purely in terms of field names.

use super::{Document, FieldSelector};
use scraper::Selector;

/// Product links on a listing page
pub const LISTING_ITEM_LINKS: FieldSelector = FieldSelector {
    name: "listing_item_links",
    css: "a.ProductItem__ImageWrapper.ProductItem__ImageWrapper--withAlternateImage",
    attr: Some("href"),
};

/// "Next page" link on a listing page
pub const LISTING_NEXT_PAGE: FieldSelector = FieldSelector {
    name: "listing_next_page",
    css: r#"a.Pagination__NavItem.Link.Link--primary[title="Next page"]"#,
    attr: Some("href"),
};

pub const PRIMARY_IMAGE: FieldSelector = FieldSelector {
    name: "primary_image_url",
    css: "a.Product__SlideshowNavImage.AspectRatio > img",
    attr: Some("src"),
};

pub const BRAND: FieldSelector = FieldSelector {
    name: "brand",
    css: "div.ProductMeta > h2.ProductMeta__Vendor.Heading.u-h1, \
          div.ProductMeta > h2.ProductMeta__Vendor.Heading.u-h1 > a",
    attr: None,
};

pub const NAME: FieldSelector = FieldSelector {
    name: "name",
    css: "h1.ProductMeta__Title.Heading.u-h3",
    attr: None,
};

/// Price text, e.g. "128.00 USD"; currency stripping happens downstream
pub const PRICE: FieldSelector = FieldSelector {
    name: "price",
    css: "span.ProductMeta__Price.Price",
    attr: None,
};

pub const COLOUR: FieldSelector = FieldSelector {
    name: "colour",
    css: "span.ProductForm__SelectedValue",
    attr: None,
};

pub const SIZES: FieldSelector = FieldSelector {
    name: "sizes",
    css: "ul.SizeSwatchList.HorizontalList.HorizontalList--spacingTight > li > label",
    attr: None,
};

/// All slideshow images; the first is the primary image
pub const IMAGES: FieldSelector = FieldSelector {
    name: "image_urls",
    css: "a.Product__SlideshowNavImage.AspectRatio > img",
    attr: Some("src"),
};

/// Product ID consumed by the review-count API, when the widget is present
pub const ENRICHMENT_KEY: FieldSelector = FieldSelector {
    name: "enrichment_key",
    css: "div.yotpo-widget-instance",
    attr: Some("data-yotpo-product-id"),
};

/// FAQ headings whose answers feed record fields
pub const FAQ_DESCRIPTION: &str = "Editor's Notes";
pub const FAQ_SIZE_AND_FIT: &str = "Size & Fit";
pub const FAQ_FABRIC_CARE: &str = "Fabric & Care";

/// Extracts (question, answer) pairs from the FAQ accordion
///
/// Answers span multiple paragraphs; the text of each is trimmed and joined
/// with single spaces. Items missing a question are skipped.
pub fn faq_entries(doc: &Document) -> Vec<(String, String)> {
    let item = match Selector::parse(r#"section[data-section-type="faq"] div.Faq__ItemWrapper"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let question = match Selector::parse("button.Faq__Question") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let answer = match Selector::parse("div.Faq__AnswerWrapper p") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    doc.html()
        .select(&item)
        .filter_map(|wrapper| {
            let q = wrapper
                .select(&question)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|q| !q.is_empty())?;

            let a = wrapper
                .select(&answer)
                .flat_map(|el| el.text())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            Some((q, a))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc(body: &str) -> Document {
        Document::parse(body, Url::parse("https://example.com/products/tee").unwrap())
    }

    #[test]
    fn faq_entries_map_questions_to_joined_answers() {
        let d = doc(
            r#"<html><body>
            <section data-section-type="faq">
              <div class="Faq__ItemWrapper">
                <button class="Faq__Question">Editor's Notes</button>
                <div class="Faq__AnswerWrapper"><p>A ribbed tee.</p><p>Soft feel.</p></div>
              </div>
              <div class="Faq__ItemWrapper">
                <button class="Faq__Question">Size &amp; Fit</button>
                <div class="Faq__AnswerWrapper"><p>Runs small.</p></div>
              </div>
            </section>
            </body></html>"#,
        );

        let entries = faq_entries(&d);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            (
                "Editor's Notes".to_string(),
                "A ribbed tee. Soft feel.".to_string()
            )
        );
        assert_eq!(entries[1], ("Size & Fit".to_string(), "Runs small.".to_string()));
    }

    #[test]
    fn faq_entries_empty_without_section() {
        let d = doc("<html><body></body></html>");
        assert!(faq_entries(&d).is_empty());
    }

    #[test]
    fn all_static_selectors_compile() {
        for field in [
            LISTING_ITEM_LINKS,
            LISTING_NEXT_PAGE,
            PRIMARY_IMAGE,
            BRAND,
            NAME,
            PRICE,
            COLOUR,
            SIZES,
            IMAGES,
            ENRICHMENT_KEY,
        ] {
            assert!(
                Selector::parse(field.css).is_ok(),
                "selector for '{}' does not compile",
                field.name
            );
        }
    }
}
