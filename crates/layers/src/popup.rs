use scene::building::{Building, value_text};
use scene::family::FeatureFamily;

const WIKI_BASE: &str = "https://wikipedia.org/wiki/";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn wiki_url(article: &str) -> String {
    format!("{WIKI_BASE}{article}")
}

/// Popup fragment: optional name, street address, optional Wikipedia link.
///
/// A missing street or house number renders as an empty slot, so the address
/// line is always present.
pub fn popup_html(building: &Building) -> String {
    let text = |key: &str| building.property_text(key).map(|s| escape_html(&s));
    let street = text("addr:street").unwrap_or_default();
    let housenumber = text("addr:housenumber").unwrap_or_default();

    let mut html = String::from("<div>");
    if let Some(name) = text("name").filter(|s| !s.is_empty()) {
        html.push_str(&format!("<p>{name}</p>"));
    }
    html.push_str(&format!("<p>{street}, {housenumber}</p>"));
    if let Some(article) = building.property_text("wikipedia").filter(|s| !s.is_empty()) {
        html.push_str(&format!(
            r#"<p><a href="{}" target="_blank">Wiki</a></p>"#,
            escape_html(&wiki_url(&article))
        ));
    }
    html.push_str("</div>");
    html
}

/// Hover text: the raw `start_date`.
pub fn tooltip_text(building: &Building) -> Option<String> {
    building.property_text("start_date")
}

/// Street popup: the title, then the naming period.
///
/// Blank dates read as `since` and `now`.
pub fn street_popup_html(street: &Building) -> String {
    let filled = |key: &str, fallback: &str| {
        street
            .filled(key)
            .and_then(value_text)
            .map(|s| escape_html(&s))
            .unwrap_or_else(|| fallback.to_string())
    };
    let title = filled("title", "");
    let from = filled("date_from_text", "since");
    let to = filled("date_to_text", "now");
    format!("<div><p>{title}</p><p>{from} - {to}</p></div>")
}

/// Street hover text: the raw `date_from_text`, empty when blank.
pub fn street_tooltip_text(street: &Building) -> String {
    street
        .filled("date_from_text")
        .and_then(value_text)
        .unwrap_or_default()
}

pub fn popup_for(family: FeatureFamily, feature: &Building) -> String {
    match family {
        FeatureFamily::Buildings => popup_html(feature),
        FeatureFamily::Streets => street_popup_html(feature),
    }
}

pub fn tooltip_for(family: FeatureFamily, feature: &Building) -> Option<String> {
    match family {
        FeatureFamily::Buildings => tooltip_text(feature),
        FeatureFamily::Streets => Some(street_tooltip_text(feature)),
    }
}
