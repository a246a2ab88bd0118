//! Form discovery and field merging.
//!
//! The whole crate rests on one mechanism: fetch a page, find the right
//! `<form>` on it, collect the hidden/default input values, merge in the
//! caller's fields, and submit to the form's `action`. This module holds
//! the pure half of that mechanism; [`crate::session`] does the I/O.
//!
//! Forms are extracted into owned [`FormData`] snapshots up front because
//! `scraper::Html` is not `Send` and must never be held across an await.

use std::collections::HashMap;

use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;

/// Owned snapshot of a single `<form>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    /// The raw `action` attribute, unresolved. `None` when absent.
    pub action: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    /// Default fields: every descendant `<input>` with a `name` and a
    /// non-empty `value`, last occurrence of a name winning.
    pub fields: HashMap<String, String>,
}

impl FormData {
    /// Whether the form's `class` attribute contains `token` as a
    /// whitespace-separated class name (not a substring match).
    pub fn has_class(&self, token: &str) -> bool {
        self.class
            .as_deref()
            .map(|classes| classes.split_whitespace().any(|c| c == token))
            .unwrap_or(false)
    }
}

/// Extract all forms from an HTML document, in document order.
///
/// Parsing is lenient: malformed or partial markup yields whatever forms
/// the html5ever tree builder recovers, never an error.
pub fn parse_forms(html: &str) -> Vec<FormData> {
    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input").unwrap();

    let document = Html::parse_document(html);
    document
        .select(&form_selector)
        .map(|form| {
            let mut fields = HashMap::new();
            for input in form.select(&input_selector) {
                let element = input.value();
                let Some(name) = element.attr("name") else {
                    continue;
                };
                match element.attr("value") {
                    Some(value) if !value.is_empty() => {
                        fields.insert(name.to_string(), value.to_string());
                    }
                    _ => {}
                }
            }
            let element = form.value();
            FormData {
                action: element.attr("action").map(str::to_string),
                id: element.attr("id").map(str::to_string),
                class: element.attr("class").map(str::to_string),
                fields,
            }
        })
        .collect()
}

/// A named test that picks exactly one form out of a page.
///
/// The selector string only exists for error messages; correctness lives
/// in the closure. Each operation documents the predicate it uses as part
/// of its contract with the live page markup.
pub struct FormPredicate {
    selector: String,
    test: Box<dyn Fn(&FormData) -> bool + Send + Sync>,
}

impl FormPredicate {
    fn build(
        selector: impl Into<String>,
        test: impl Fn(&FormData) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            test: Box::new(test),
        }
    }

    /// Matches every form; used for pages known to carry exactly one.
    pub fn any() -> Self {
        Self::build("any form", |_| true)
    }

    /// Matches a form by its exact `id` attribute.
    pub fn with_id(id: &str) -> Self {
        let want = id.to_string();
        Self::build(format!("form with id \"{id}\""), move |form| {
            form.id.as_deref() == Some(want.as_str())
        })
    }

    /// Matches a form whose `action` contains the given fragment.
    pub fn action_contains(fragment: &str) -> Self {
        let want = fragment.to_string();
        Self::build(format!("form with action containing \"{fragment}\""), move |form| {
            form.action
                .as_deref()
                .map(|action| action.contains(&want))
                .unwrap_or(false)
        })
    }

    /// Matches a form whose `action` ends with the given suffix.
    ///
    /// Sharper than [`FormPredicate::action_contains`] when one toggle's
    /// path is a prefix of another's.
    pub fn action_ends_with(suffix: &str) -> Self {
        let want = suffix.to_string();
        Self::build(format!("form with action ending in \"{suffix}\""), move |form| {
            form.action
                .as_deref()
                .map(|action| action.ends_with(&want))
                .unwrap_or(false)
        })
    }

    /// Matches a form carrying the given class token.
    pub fn class_token(token: &str) -> Self {
        let want = token.to_string();
        Self::build(format!("form with class \"{token}\""), move |form| {
            form.has_class(&want)
        })
    }

    /// Both predicates must hold.
    pub fn and(self, other: FormPredicate) -> Self {
        let selector = format!("{} and {}", self.selector, other.selector);
        let (a, b) = (self.test, other.test);
        Self {
            selector,
            test: Box::new(move |form| a(form) && b(form)),
        }
    }

    pub fn matches(&self, form: &FormData) -> bool {
        (self.test)(form)
    }

    /// Human-readable description, for `FormNotFound` errors.
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl std::fmt::Debug for FormPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormPredicate")
            .field("selector", &self.selector)
            .finish()
    }
}

/// Merge caller overrides into a form's default fields.
///
/// Overrides win over defaults and may introduce fields absent from the
/// form; within the override list, later entries win.
pub fn merge_fields(
    defaults: HashMap<String, String>,
    overrides: &[(String, String)],
) -> HashMap<String, String> {
    let mut merged = defaults;
    for (name, value) in overrides {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

/// Resolve a form's `action` against the URL the page was fetched from.
///
/// Relative actions join per standard URL rules; absolute actions pass
/// through unchanged. A missing or empty action submits back to the page
/// itself, which is what browsers do.
pub fn resolve_action(page_url: &Url, action: Option<&str>) -> Result<Url> {
    match action {
        Some(action) if !action.is_empty() => Ok(page_url.join(action)?),
        _ => Ok(page_url.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FORMS: &str = r#"
        <html><body>
          <form action="/first" id="first-form" class="login-form js-toggle">
            <input type="hidden" name="authenticity_token" value="tok1">
            <input type="text" name="unfilled" value="">
            <input type="text" value="orphan">
            <input type="hidden" name="repeated" value="old">
            <input type="hidden" name="repeated" value="new">
          </form>
          <form action="second" id="second-form">
            <input type="hidden" name="key" value="value2">
          </form>
        </body></html>
    "#;

    #[test]
    fn forms_come_back_in_document_order() {
        let forms = parse_forms(TWO_FORMS);
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].id.as_deref(), Some("first-form"));
        assert_eq!(forms[1].id.as_deref(), Some("second-form"));
    }

    #[test]
    fn field_collection_skips_nameless_and_empty_inputs() {
        let forms = parse_forms(TWO_FORMS);
        let fields = &forms[0].fields;
        assert_eq!(fields.get("authenticity_token").map(String::as_str), Some("tok1"));
        assert!(!fields.contains_key("unfilled"));
        assert!(!fields.values().any(|v| v == "orphan"));
    }

    #[test]
    fn duplicate_input_names_take_the_last_occurrence() {
        let forms = parse_forms(TWO_FORMS);
        assert_eq!(forms[0].fields.get("repeated").map(String::as_str), Some("new"));
    }

    #[test]
    fn malformed_markup_still_yields_forms() {
        let html = "<form action='/a'><input name='k' value='v'><p>unclosed";
        let forms = parse_forms(html);
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].fields.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn no_forms_is_an_empty_vec() {
        assert!(parse_forms("<html><body><p>nothing here</p></body></html>").is_empty());
    }

    #[test]
    fn predicate_with_id_picks_the_named_form() {
        let forms = parse_forms(TWO_FORMS);
        let predicate = FormPredicate::with_id("second-form");
        let found = forms.iter().find(|f| predicate.matches(f)).unwrap();
        assert_eq!(found.action.as_deref(), Some("second"));
    }

    #[test]
    fn predicate_any_picks_the_first_form() {
        let forms = parse_forms(TWO_FORMS);
        let predicate = FormPredicate::any();
        let found = forms.iter().find(|f| predicate.matches(f)).unwrap();
        assert_eq!(found.id.as_deref(), Some("first-form"));
    }

    #[test]
    fn class_token_matches_whole_tokens_only() {
        let forms = parse_forms(TWO_FORMS);
        assert!(FormPredicate::class_token("js-toggle").matches(&forms[0]));
        assert!(!FormPredicate::class_token("js").matches(&forms[0]));
        assert!(!FormPredicate::class_token("js-toggle").matches(&forms[1]));
    }

    #[test]
    fn action_ends_with_distinguishes_prefix_paths() {
        let forms = parse_forms(
            r#"<form action="/org/settings/secret_scanning_push_protection"></form>
               <form action="/org/settings/secret_scanning"></form>"#,
        );
        let predicate = FormPredicate::action_ends_with("/secret_scanning");
        let matches: Vec<_> = forms.iter().filter(|f| predicate.matches(f)).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].action.as_deref(),
            Some("/org/settings/secret_scanning")
        );
    }

    #[test]
    fn and_combines_predicates_and_descriptions() {
        let forms = parse_forms(TWO_FORMS);
        let predicate =
            FormPredicate::class_token("js-toggle").and(FormPredicate::action_contains("first"));
        assert!(predicate.matches(&forms[0]));
        assert!(!predicate.matches(&forms[1]));
        assert!(predicate.selector().contains("js-toggle"));
        assert!(predicate.selector().contains("first"));
    }

    #[test]
    fn overrides_win_and_can_add_fields() {
        let mut defaults = HashMap::new();
        defaults.insert("token".to_string(), "abc".to_string());
        defaults.insert("kept".to_string(), "default".to_string());

        let merged = merge_fields(
            defaults,
            &[
                ("token".to_string(), "replaced".to_string()),
                ("added".to_string(), "yes".to_string()),
            ],
        );

        assert_eq!(merged.get("token").map(String::as_str), Some("replaced"));
        assert_eq!(merged.get("kept").map(String::as_str), Some("default"));
        assert_eq!(merged.get("added").map(String::as_str), Some("yes"));
    }

    #[test]
    fn relative_actions_resolve_against_the_page_url() {
        let page = Url::parse("https://example.com/settings/page").unwrap();
        let resolved = resolve_action(&page, Some("/submit")).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/submit");

        let resolved = resolve_action(&page, Some("sibling")).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/settings/sibling");
    }

    #[test]
    fn absolute_actions_pass_through() {
        let page = Url::parse("https://example.com/settings/page").unwrap();
        let resolved = resolve_action(&page, Some("https://other.test/target")).unwrap();
        assert_eq!(resolved.as_str(), "https://other.test/target");
    }

    #[test]
    fn missing_action_submits_back_to_the_page() {
        let page = Url::parse("https://example.com/settings/page").unwrap();
        assert_eq!(resolve_action(&page, None).unwrap(), page);
        assert_eq!(resolve_action(&page, Some("")).unwrap(), page);
    }
}
