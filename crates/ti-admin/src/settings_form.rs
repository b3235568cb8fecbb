//! Settings page

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use ti_core::html::escape;
use ti_core::{RequestContext, SettingsError, SettingsNotice};

/// One checkbox on the settings form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyOption {
    /// Registered name, also the submitted value
    pub name: String,
    /// Plural label
    pub label: String,
    /// Input element id
    pub id: String,
    /// Image support currently enabled
    pub checked: bool,
}

/// Taxonomies offered on the form: registered ones with admin screens
#[must_use]
pub fn taxonomy_options(context: &RequestContext) -> Vec<TaxonomyOption> {
    let settings = context.settings();
    context
        .host()
        .taxonomies()
        .into_iter()
        .filter(|t| t.show_ui)
        .map(|t| TaxonomyOption {
            id: format!("taxonomy-images-{}", t.name),
            checked: settings.has_image_support(&t.name),
            label: if t.label.is_empty() { t.name.clone() } else { t.label },
            name: t.name,
        })
        .collect()
}

/// Render the taxonomy checkboxes
#[must_use]
pub fn render(options: &[TaxonomyOption]) -> String {
    let mut html = String::new();
    for option in options {
        let checked = if option.checked { " checked=\"checked\"" } else { "" };
        let _ = write!(
            html,
            "<label for=\"{id}\"><input type=\"checkbox\" id=\"{id}\" \
             name=\"taxonomy_image_plugin_settings[taxonomies][]\" value=\"{name}\"{checked} /> {label}</label><br />",
            id = escape(&option.id),
            name = escape(&option.name),
            label = escape(&option.label),
        );
    }
    html
}

/// Persist submitted settings
///
/// # Errors
/// Returns error if the submission is malformed or cannot be stored
pub fn submit(context: &RequestContext, form: &Value) -> Result<SettingsNotice, SettingsError> {
    let notice = context.save_settings(form)?;
    tracing::info!(%notice, "settings saved");
    Ok(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use ti_test_utils::{category_fixture, context};

    #[test]
    fn options_reflect_settings() {
        let host = category_fixture();
        host.register_taxonomy("nav_menu", "Menus", "Menu");
        let context = context(&host);

        let options = taxonomy_options(&context);
        let names: Vec<(&str, bool)> = options.iter().map(|o| (o.name.as_str(), o.checked)).collect();
        assert!(names.contains(&("category", true)));
        assert!(names.contains(&("post_tag", false)));
        assert_eq!(options[0].id, format!("taxonomy-images-{}", options[0].name));
    }

    #[test]
    fn render_marks_checked() {
        let options = vec![TaxonomyOption {
            name: "category".into(),
            label: "Categories".into(),
            id: "taxonomy-images-category".into(),
            checked: true,
        }];
        let html = render(&options);
        assert!(html.contains("value=\"category\" checked=\"checked\""));
        assert!(html.contains("Categories</label>"));
    }

    #[test]
    fn render_escapes_fields() {
        let options = vec![TaxonomyOption {
            name: "genre\" onclick=\"x".into(),
            label: "<script>alert(1)</script>".into(),
            id: "taxonomy-images-<genre>".into(),
            checked: false,
        }];
        let html = render(&options);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;</label>"));
        assert!(html.contains("value=\"genre&quot; onclick=&quot;x\" />"));
        assert!(html.contains("for=\"taxonomy-images-&lt;genre&gt;\""));
    }

    #[test]
    fn submit_updates_and_disables() {
        let host = category_fixture();
        let context = context(&host);

        let notice = submit(&context, &json!({"taxonomies": ["post_tag", "bogus"]})).unwrap();
        assert_eq!(notice, SettingsNotice::Updated);
        assert!(context.has_image_support("post_tag"));
        assert!(!context.has_image_support("category"));

        let notice = submit(&context, &json!({"taxonomies": []})).unwrap();
        assert_eq!(notice, SettingsNotice::Disabled);
        assert!(context.settings().taxonomies.is_empty());
    }
}
