use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::CompanyProfile;
use crate::parser::tables::text_of;

static BREADCRUMB: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".breadcrumb").unwrap());

/// Category and industry from the `Home › Category › Industry` breadcrumb.
pub fn extract(doc: &Html) -> CompanyProfile {
    let Some(el) = doc.select(&BREADCRUMB).next() else {
        return CompanyProfile::default();
    };
    let text = text_of(el);
    let parts: Vec<&str> = text.split('›').map(str::trim).collect();
    if parts.len() < 3 {
        return CompanyProfile::default();
    }
    CompanyProfile {
        category: parts[1].to_string(),
        industry: parts[2].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_breadcrumb() {
        let doc = Html::parse_document(
            r#"<div class="breadcrumb"><a>Home</a> › <a>Large Cap</a> ›
               <a>Oil &amp; Gas</a></div>"#,
        );
        let p = extract(&doc);
        assert_eq!(p.category, "Large Cap");
        assert_eq!(p.industry, "Oil & Gas");
    }

    #[test]
    fn short_or_missing_breadcrumb() {
        let short = Html::parse_document(r#"<div class="breadcrumb">Home › Only</div>"#);
        assert_eq!(extract(&short), CompanyProfile::default());
        let none = Html::parse_document("<p>nothing</p>");
        assert_eq!(extract(&none), CompanyProfile::default());
    }
}
