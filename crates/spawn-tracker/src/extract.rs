//! Locate the metric in rendered markup and coerce it to an integer.
//!
//! Elements are matched by substring containment on the raw `class`
//! attribute, so extra co-occurring classes or reordering do not matter.

use scraper::{ElementRef, Html};

use crate::config::Markers;
use crate::error::{TrackerError, TrackerResult};

/// Which part of the expected structure was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingElement {
    /// No `div` whose class contains the container marker.
    Container,
    /// The container exists but holds no `span` with the inner marker.
    Inner,
}

/// Return the trimmed text of the metric element.
pub fn locate_metric_text(html: &str, markers: &Markers) -> Result<String, MissingElement> {
    let document = Html::parse_document(html);

    let container = find_by_class(document.root_element(), "div", &markers.container)
        .ok_or(MissingElement::Container)?;
    let inner =
        find_by_class(container, "span", &markers.inner).ok_or(MissingElement::Inner)?;

    Ok(inner.text().collect::<String>().trim().to_string())
}

/// Extract the metric value.
///
/// Returns `Ok(None)` when either element is missing and
/// `Err(TrackerError::Conversion)` when the text is not an integer.
pub fn extract_metric(html: &str, markers: &Markers) -> TrackerResult<Option<u64>> {
    match locate_metric_text(html, markers) {
        Ok(text) => {
            tracing::info!("Found metric text: {text}");
            parse_metric(&text).map(Some)
        }
        Err(MissingElement::Container) => {
            tracing::error!("Div element with class '{}' not found", markers.container);
            Ok(None)
        }
        Err(MissingElement::Inner) => {
            tracing::error!(
                "Span element with class '{}' not found inside div",
                markers.inner
            );
            Ok(None)
        }
    }
}

/// Parse metric text as an unsigned integer.
///
/// Thousands separators (`,` `_` space, no-break and narrow no-break space)
/// are accepted only between two digits. Anything else is rejected.
pub fn parse_metric(text: &str) -> TrackerResult<u64> {
    let trimmed = text.trim();
    let conversion = |reason: String| TrackerError::Conversion {
        text: trimmed.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(conversion("empty text".to_string()));
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut digits = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let between_digits = i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit());
        if between_digits && is_group_separator(c) {
            continue;
        }
        return Err(conversion(format!("unexpected character {c:?}")));
    }

    digits
        .parse::<u64>()
        .map_err(|e| conversion(e.to_string()))
}

fn is_group_separator(c: char) -> bool {
    matches!(c, ',' | '_' | ' ' | '\u{00A0}' | '\u{202F}')
}

/// First descendant `tag` of `scope` whose class attribute contains `marker`.
fn find_by_class<'a>(scope: ElementRef<'a>, tag: &str, marker: &str) -> Option<ElementRef<'a>> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().name() == tag
                && el
                    .value()
                    .attr("class")
                    .is_some_and(|class| class.contains(marker))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Markers {
        Markers::default()
    }

    #[test]
    fn test_extract_with_extra_classes() {
        let html = r#"<div class="x online-spawn y"><span class="a ml-1 b">1234</span></div>"#;
        assert_eq!(extract_metric(html, &markers()).unwrap(), Some(1234));
    }

    #[test]
    fn test_extract_trims_whitespace_and_nested_markup() {
        let html = r#"
            <html><body>
              <div class="flex online-spawn-counter">
                <i class="icon"></i>
                <span class="ml-1 font-bold">
                  <b> 87 </b>
                </span>
              </div>
            </body></html>"#;
        assert_eq!(extract_metric(html, &markers()).unwrap(), Some(87));
    }

    #[test]
    fn test_extract_uses_first_matching_container() {
        let html = r#"
            <div class="online-spawn"><span class="ml-1">5</span></div>
            <div class="online-spawn"><span class="ml-1">9</span></div>"#;
        assert_eq!(extract_metric(html, &markers()).unwrap(), Some(5));
    }

    #[test]
    fn test_missing_container_is_no_value() {
        let html = r#"<div class="offline"><span class="ml-1">12</span></div>"#;
        assert_eq!(
            locate_metric_text(html, &markers()),
            Err(MissingElement::Container)
        );
        assert_eq!(extract_metric(html, &markers()).unwrap(), None);
    }

    #[test]
    fn test_missing_inner_is_no_value() {
        let html = r#"<div class="online-spawn"><span class="mr-1">12</span></div>"#;
        assert_eq!(locate_metric_text(html, &markers()), Err(MissingElement::Inner));
        assert_eq!(extract_metric(html, &markers()).unwrap(), None);
    }

    #[test]
    fn test_span_outside_container_is_not_used() {
        let html = r#"
            <span class="ml-1">44</span>
            <div class="online-spawn"><em>offline</em></div>"#;
        assert_eq!(extract_metric(html, &markers()).unwrap(), None);
    }

    #[test]
    fn test_non_numeric_text_is_conversion_error() {
        let html = r#"<div class="online-spawn"><span class="ml-1">many</span></div>"#;
        let err = extract_metric(html, &markers()).unwrap_err();
        match err {
            TrackerError::Conversion { text, .. } => assert_eq!(text, "many"),
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_markers() {
        let markers = Markers {
            container: "players".to_string(),
            inner: "count".to_string(),
        };
        let html = r#"<div class="players-box"><span class="count">3</span></div>"#;
        assert_eq!(extract_metric(html, &markers).unwrap(), Some(3));
    }

    #[test]
    fn test_parse_metric_group_separators() {
        assert_eq!(parse_metric("1,234").unwrap(), 1234);
        assert_eq!(parse_metric("1 234 567").unwrap(), 1_234_567);
        assert_eq!(parse_metric("12\u{00A0}345").unwrap(), 12345);
        assert_eq!(parse_metric("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_metric_rejects() {
        for bad in ["", "  ", "-5", "+5", "1.5", "1.2k", ",123", "123,", "1,,234", "12a"] {
            assert!(
                matches!(parse_metric(bad), Err(TrackerError::Conversion { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_metric_overflow() {
        assert!(parse_metric("99999999999999999999999").is_err());
    }
}
