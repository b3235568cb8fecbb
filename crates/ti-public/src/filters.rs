//! Public query accessors
//!
//! Themes reach these through [`PublicFilters::apply`] by filter name.
//! The typed methods stay public for Rust callers but report a
//! diagnostic, mirroring the host convention that only the filter
//! names are a supported interface.

use crate::args::{GetTermsArgs, GetTheTermsArgs, ImageSizeArgs, ListTheTermsArgs, QueriedImageArgs};
use crate::error::FilterError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use ti_core::html::escape_url;
use ti_core::{
    AttachmentId, AttachmentPost, ImageSrc, ImageType, PostId, RequestContext, TermRecord, TermRef,
};

/// `taxonomy-images-get-terms`
pub const GET_TERMS: &str = "taxonomy-images-get-terms";
/// `taxonomy-images-get-the-terms`
pub const GET_THE_TERMS: &str = "taxonomy-images-get-the-terms";
/// `taxonomy-images-list-the-terms`
pub const LIST_THE_TERMS: &str = "taxonomy-images-list-the-terms";
/// `taxonomy-images-queried-term-image`
pub const QUERIED_TERM_IMAGE: &str = "taxonomy-images-queried-term-image";
/// `taxonomy-images-queried-term-image-data`
pub const QUERIED_TERM_IMAGE_DATA: &str = "taxonomy-images-queried-term-image-data";
/// `taxonomy-images-queried-term-image-id`
pub const QUERIED_TERM_IMAGE_ID: &str = "taxonomy-images-queried-term-image-id";
/// `taxonomy-images-queried-term-image-object`
pub const QUERIED_TERM_IMAGE_OBJECT: &str = "taxonomy-images-queried-term-image-object";
/// `taxonomy-images-queried-term-image-url`
pub const QUERIED_TERM_IMAGE_URL: &str = "taxonomy-images-queried-term-image-url";

/// Every filter name [`PublicFilters::apply`] understands
pub const FILTER_NAMES: [&str; 8] = [
    GET_TERMS,
    GET_THE_TERMS,
    LIST_THE_TERMS,
    QUERIED_TERM_IMAGE,
    QUERIED_TERM_IMAGE_DATA,
    QUERIED_TERM_IMAGE_ID,
    QUERIED_TERM_IMAGE_OBJECT,
    QUERIED_TERM_IMAGE_URL,
];

/// Object the current page was queried for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QueriedObject {
    /// Term archive
    Term(TermRecord),
    /// Single post
    Post {
        /// Post id
        id: PostId,
    },
    /// Anything else (front page, search, 404)
    #[default]
    Other,
}

/// Term with its featured image id, 0 if it has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagedTerm {
    /// Host term record
    #[serde(flatten)]
    pub term: TermRecord,
    /// Associated attachment, 0 if none
    pub image_id: u64,
}

impl ImagedTerm {
    /// Associated attachment
    #[must_use]
    pub fn image(&self) -> Option<AttachmentId> {
        AttachmentId::new(self.image_id)
    }
}

/// Accessors bound to one request
#[derive(Debug, Clone, Copy)]
pub struct PublicFilters<'a> {
    context: &'a RequestContext,
    current_post: Option<PostId>,
}

impl<'a> PublicFilters<'a> {
    /// Create accessors for a request
    #[inline]
    #[must_use]
    pub fn new(context: &'a RequestContext) -> Self {
        Self {
            context,
            current_post: None,
        }
    }

    /// Post used when arguments name none
    #[inline]
    #[must_use]
    pub fn with_current_post(mut self, post: PostId) -> Self {
        self.current_post = Some(post);
        self
    }

    /// Run the accessor registered under `filter`
    ///
    /// # Errors
    /// Returns error for an unknown filter name or arguments of the wrong shape
    pub fn apply(&self, filter: &str, queried: &QueriedObject, args: &Value) -> Result<Value, FilterError> {
        let value = match filter {
            GET_TERMS => serde_json::to_value(self.terms(&parse(filter, args)?))?,
            GET_THE_TERMS => serde_json::to_value(self.the_terms(&parse(filter, args)?))?,
            LIST_THE_TERMS => Value::String(self.list(&parse(filter, args)?)),
            QUERIED_TERM_IMAGE => Value::String(self.image_markup(queried, &parse(filter, args)?)),
            QUERIED_TERM_IMAGE_DATA => match self.image_data(queried, &parse(filter, args)?) {
                Some(src) => serde_json::to_value(src)?,
                None => Value::Object(serde_json::Map::new()),
            },
            QUERIED_TERM_IMAGE_ID => Value::from(self.image_id(queried).map_or(0, AttachmentId::get)),
            QUERIED_TERM_IMAGE_OBJECT => match self.image_object(queried) {
                Some(post) => serde_json::to_value(post)?,
                None => Value::Object(serde_json::Map::new()),
            },
            QUERIED_TERM_IMAGE_URL => Value::String(self.image_url(queried, &parse(filter, args)?)),
            _ => return Err(FilterError::UnknownFilter(filter.to_string())),
        };
        Ok(value)
    }

    /// Terms of one or more taxonomies with their image ids
    #[must_use]
    pub fn get_terms(&self, args: &GetTermsArgs) -> Vec<ImagedTerm> {
        self.direct_call("get_terms", GET_TERMS);
        self.terms(args)
    }

    /// Terms of a post with their image ids
    #[must_use]
    pub fn get_the_terms(&self, args: &GetTheTermsArgs) -> Vec<ImagedTerm> {
        self.direct_call("get_the_terms", GET_THE_TERMS);
        self.the_terms(args)
    }

    /// Linked image markup for the imaged terms of a post
    #[must_use]
    pub fn list_the_terms(&self, args: &ListTheTermsArgs) -> String {
        self.direct_call("list_the_terms", LIST_THE_TERMS);
        self.list(args)
    }

    /// Image markup for the queried term
    #[must_use]
    pub fn queried_term_image(&self, queried: &QueriedObject, args: &QueriedImageArgs) -> String {
        self.direct_call("queried_term_image", QUERIED_TERM_IMAGE);
        self.image_markup(queried, args)
    }

    /// Image source at a size for the queried term
    #[must_use]
    pub fn queried_term_image_data(&self, queried: &QueriedObject, args: &ImageSizeArgs) -> Option<ImageSrc> {
        self.direct_call("queried_term_image_data", QUERIED_TERM_IMAGE_DATA);
        self.image_data(queried, args)
    }

    /// Image id of the queried term
    #[must_use]
    pub fn queried_term_image_id(&self, queried: &QueriedObject) -> Option<AttachmentId> {
        self.direct_call("queried_term_image_id", QUERIED_TERM_IMAGE_ID);
        self.image_id(queried)
    }

    /// Attachment record for the queried term's image
    #[must_use]
    pub fn queried_term_image_object(&self, queried: &QueriedObject) -> Option<AttachmentPost> {
        self.direct_call("queried_term_image_object", QUERIED_TERM_IMAGE_OBJECT);
        self.image_object(queried)
    }

    /// Image URL at a size for the queried term, empty if none
    #[must_use]
    pub fn queried_term_image_url(&self, queried: &QueriedObject, args: &ImageSizeArgs) -> String {
        self.direct_call("queried_term_image_url", QUERIED_TERM_IMAGE_URL);
        self.image_url(queried, args)
    }

    fn terms(&self, args: &GetTermsArgs) -> Vec<ImagedTerm> {
        let taxonomies = args.taxonomies();
        if !taxonomies.iter().all(|t| self.check_taxonomy(t, GET_TERMS)) {
            return Vec::new();
        }

        let terms = self.with_images(self.context.host().terms(&taxonomies));
        if args.cache_images {
            let mut seen = BTreeSet::new();
            let ids: Vec<AttachmentId> = terms
                .iter()
                .filter_map(ImagedTerm::image)
                .filter(|id| seen.insert(*id))
                .collect();
            if !ids.is_empty() {
                self.context.host().prime_attachments(&ids);
            }
        }
        keep_imaged(terms, args.having_images)
    }

    fn the_terms(&self, args: &GetTheTermsArgs) -> Vec<ImagedTerm> {
        if !self.check_taxonomy(&args.taxonomy, GET_THE_TERMS) {
            return Vec::new();
        }
        let Some(post) = args.post_id.or(self.current_post) else {
            return Vec::new();
        };
        let terms = self.with_images(self.context.host().object_terms(post, &args.taxonomy));
        keep_imaged(terms, args.having_images)
    }

    fn list(&self, args: &ListTheTermsArgs) -> String {
        if !self.check_taxonomy(&args.taxonomy, LIST_THE_TERMS) {
            return String::new();
        }

        let query = GetTheTermsArgs {
            post_id: args.post_id,
            taxonomy: args.taxonomy.clone(),
            having_images: true,
        };
        let host = self.context.host();
        let no_attrs = std::collections::BTreeMap::new();

        let mut output = String::new();
        for term in self.the_terms(&query) {
            let Some(id) = term.image() else { continue };
            let Some(image) = host.attachment_image(id, &args.image_size, &no_attrs) else {
                continue;
            };
            let _ = write!(
                output,
                "{}<a href=\"{}\">{image}</a>{}",
                args.before_image,
                escape_url(&host.term_link(&term.term)),
                args.after_image
            );
        }

        if output.is_empty() {
            return output;
        }
        format!("{}{output}{}", args.before, args.after)
    }

    fn image_id(&self, queried: &QueriedObject) -> Option<AttachmentId> {
        let QueriedObject::Term(term) = queried else {
            self.context.diagnostics().notice(
                QUERIED_TERM_IMAGE_ID,
                &format!(
                    "term_id is not a property of the current queried object. This usually happens when the \
                     {QUERIED_TERM_IMAGE_ID} filter is used in an unsupported template file. This filter has been \
                     designed to work in taxonomy archives."
                ),
            );
            return None;
        };
        if !self.check_taxonomy(&term.taxonomy, QUERIED_TERM_IMAGE_ID) {
            return None;
        }
        self.context
            .images()
            .get_image_id(&term_ref(term), &ImageType::featured())
    }

    fn image_markup(&self, queried: &QueriedObject, args: &QueriedImageArgs) -> String {
        self.image_id(queried)
            .and_then(|id| {
                self.context
                    .host()
                    .attachment_image(id, &args.image_size, &args.attr)
            })
            .map(|html| format!("{}{html}{}", args.before, args.after))
            .unwrap_or_default()
    }

    fn image_data(&self, queried: &QueriedObject, args: &ImageSizeArgs) -> Option<ImageSrc> {
        let id = self.image_id(queried)?;
        let host = self.context.host();
        if args.is_full() {
            host.full_src(id)
        } else {
            host.intermediate_src(id, &args.image_size)
        }
    }

    fn image_object(&self, queried: &QueriedObject) -> Option<AttachmentPost> {
        self.image_id(queried)
            .and_then(|id| self.context.host().attachment_post(id))
    }

    fn image_url(&self, queried: &QueriedObject, args: &ImageSizeArgs) -> String {
        self.image_data(queried, args)
            .map(|src| src.url)
            .unwrap_or_default()
    }

    fn with_images(&self, terms: Vec<TermRecord>) -> Vec<ImagedTerm> {
        let featured = ImageType::featured();
        terms
            .into_iter()
            .map(|term| {
                let image_id = self
                    .context
                    .images()
                    .get_image_id(&term_ref(&term), &featured)
                    .map_or(0, AttachmentId::get);
                ImagedTerm { term, image_id }
            })
            .collect()
    }

    /// Taxonomy is registered and has image support, with a notice if not
    fn check_taxonomy(&self, taxonomy: &str, filter: &str) -> bool {
        let diagnostics = self.context.diagnostics();
        if !self.context.host().taxonomy_exists(taxonomy) {
            diagnostics.notice(
                filter,
                &format!(
                    "The taxonomy argument for {filter} is set to {taxonomy} which is not a registered \
                     taxonomy. Please check the spelling and update the argument."
                ),
            );
            return false;
        }

        let settings = self.context.settings();
        if settings.taxonomies.is_empty() {
            diagnostics.notice(filter, "No taxonomies have image support.");
            return false;
        }
        if !settings.has_image_support(taxonomy) {
            diagnostics.notice(
                filter,
                &format!("The {taxonomy} taxonomy does not have image support."),
            );
            return false;
        }
        true
    }

    fn direct_call(&self, function: &str, filter: &str) {
        self.context
            .diagnostics()
            .use_filter(&format!("{function}()"), filter);
    }
}

fn term_ref(term: &TermRecord) -> TermRef {
    TermRef::resolved(term.term_id.0, term.taxonomy.clone())
}

/// Only imaged terms when asked and at least one has an image
fn keep_imaged(terms: Vec<ImagedTerm>, having_images: bool) -> Vec<ImagedTerm> {
    if having_images && terms.iter().any(|t| t.image_id != 0) {
        terms.into_iter().filter(|t| t.image_id != 0).collect()
    } else {
        terms
    }
}

fn parse<T: DeserializeOwned + Default>(filter: &str, args: &Value) -> Result<T, FilterError> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args.clone()).map_err(|source| FilterError::InvalidArgs {
        filter: filter.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use ti_core::{TermId, TermRegistry};
    use ti_test_utils::{attachment, category_fixture, context, upload_url};

    fn term(host: &ti_core::InMemoryHost, id: u64) -> TermRecord {
        host.terms_by_id(TermId(id)).remove(0)
    }

    #[test]
    fn get_terms_having_images() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context);
        let null = QueriedObject::Other;

        let all: Vec<ImagedTerm> =
            serde_json::from_value(filters.apply(GET_TERMS, &null, &Value::Null).unwrap()).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.image_id == 0));

        context
            .images()
            .update_image_id(&TermRef::by_id(7), 99, &ImageType::featured())
            .unwrap();
        let imaged: Vec<ImagedTerm> =
            serde_json::from_value(filters.apply(GET_TERMS, &null, &Value::Null).unwrap()).unwrap();
        assert_eq!(imaged.len(), 1);
        assert_eq!(imaged[0].term.name, "News");
        assert_eq!(imaged[0].image_id, 99);
        assert_eq!(host.primed_attachments(), [attachment(99)]);

        let every = filters.apply(GET_TERMS, &null, &json!({"having_images": false})).unwrap();
        assert_eq!(every.as_array().map(Vec::len), Some(2));
        assert_eq!(context.diagnostics().emitted(), 0);
    }

    #[test]
    fn get_terms_rejects_unsupported_taxonomy() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context);

        let args = GetTermsArgs {
            taxonomy: "category,post_tag".into(),
            ..GetTermsArgs::default()
        };
        assert!(filters.terms(&args).is_empty());

        let args = GetTermsArgs {
            taxonomy: "genre".into(),
            ..GetTermsArgs::default()
        };
        assert!(filters.terms(&args).is_empty());
        assert_eq!(context.diagnostics().emitted(), 2);
    }

    #[test]
    fn direct_call_is_reported() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context);

        let terms = filters.get_terms(&GetTermsArgs::default());
        assert_eq!(terms.len(), 2);
        assert_eq!(context.diagnostics().emitted(), 1);
    }

    #[test]
    fn get_the_terms_uses_current_post() {
        let host = category_fixture();
        let context = context(&host);

        assert!(PublicFilters::new(&context)
            .the_terms(&GetTheTermsArgs::default())
            .is_empty());

        let filters = PublicFilters::new(&context).with_current_post(PostId(1));
        let names: Vec<String> = filters
            .the_terms(&GetTheTermsArgs::default())
            .into_iter()
            .map(|t| t.term.name)
            .collect();
        assert_eq!(names, ["News", "Sports"]);
    }

    #[test]
    fn list_the_terms_links_images() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context).with_current_post(PostId(1));
        assert_eq!(filters.list(&ListTheTermsArgs::default()), "");

        context
            .images()
            .update_image_id(&TermRef::by_id(8), 100, &ImageType::featured())
            .unwrap();
        let html = filters.list(&ListTheTermsArgs::default());
        assert!(html.starts_with("<ul class=\"taxonomy-images-the-terms\"><li><a href=\"https://example.test/category/sports/\"><img "));
        assert!(html.contains("image-100-150x150.jpg"));
        assert!(html.ends_with("</a></li></ul>"));
        assert!(!html.contains("/category/news/"));
    }

    #[test]
    fn list_escapes_term_links() {
        let mut snapshot = category_fixture().snapshot();
        snapshot.site_url = "https://example.test/\" onmouseover=\"x".into();
        let host = std::sync::Arc::new(ti_core::InMemoryHost::from_snapshot(snapshot));
        let context = context(&host);
        context
            .images()
            .update_image_id(&TermRef::by_id(8), 100, &ImageType::featured())
            .unwrap();

        let html = PublicFilters::new(&context)
            .with_current_post(PostId(1))
            .list(&ListTheTermsArgs::default());
        assert!(html.contains("<a href=\"https://example.test/onmouseover=x/category/sports/\">"));
        assert!(!html.contains("\" onmouseover"));
    }

    #[test]
    fn queried_term_accessors() {
        let host = category_fixture();
        let context = context(&host);
        context
            .images()
            .update_image_id(&TermRef::by_id(7), 99, &ImageType::featured())
            .unwrap();
        let filters = PublicFilters::new(&context);
        let queried = QueriedObject::Term(term(&host, 7));

        assert_eq!(filters.image_id(&queried), Some(attachment(99)));
        assert_eq!(
            filters.apply(QUERIED_TERM_IMAGE_ID, &queried, &Value::Null).unwrap(),
            json!(99)
        );

        let thumb = filters.image_data(&queried, &ImageSizeArgs::default()).unwrap();
        assert_eq!((thumb.width, thumb.height), (150, 150));
        assert_eq!(filters.image_url(&queried, &ImageSizeArgs::new("fullsize")), upload_url(99));
        assert_eq!(filters.image_url(&queried, &ImageSizeArgs::new("medium")), "");

        let args = QueriedImageArgs {
            before: "<div>".into(),
            after: "</div>".into(),
            attr: [("class".to_string(), "my-class".to_string())].into_iter().collect(),
            ..QueriedImageArgs::default()
        };
        let html = filters.image_markup(&queried, &args);
        assert!(html.starts_with("<div><img "));
        assert!(html.contains("class=\"my-class\""));
        assert!(html.ends_with("</div>"));

        let object = filters.image_object(&queried).unwrap();
        assert_eq!(object.id, attachment(99));
        assert_eq!(context.diagnostics().emitted(), 0);
    }

    #[test]
    fn queried_non_term_degrades() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context);
        let queried = QueriedObject::Post { id: PostId(1) };

        assert_eq!(
            filters.apply(QUERIED_TERM_IMAGE_ID, &queried, &Value::Null).unwrap(),
            json!(0)
        );
        assert_eq!(
            filters.apply(QUERIED_TERM_IMAGE_DATA, &queried, &Value::Null).unwrap(),
            json!({})
        );
        assert_eq!(
            filters.apply(QUERIED_TERM_IMAGE_URL, &queried, &Value::Null).unwrap(),
            json!("")
        );
        assert_eq!(context.diagnostics().emitted(), 3);
    }

    #[test]
    fn queried_term_without_support_is_empty() {
        let host = category_fixture();
        let context = context(&host);
        context
            .images()
            .update_image_id(&TermRef::by_id(9), 99, &ImageType::featured())
            .unwrap();
        let filters = PublicFilters::new(&context);
        assert_eq!(filters.image_id(&QueriedObject::Term(term(&host, 9))), None);
    }

    #[test]
    fn apply_rejects_unknown_and_bad_args() {
        let host = category_fixture();
        let context = context(&host);
        let filters = PublicFilters::new(&context);

        assert!(matches!(
            filters.apply("taxonomy-images-nope", &QueriedObject::Other, &Value::Null),
            Err(FilterError::UnknownFilter(_))
        ));
        assert!(matches!(
            filters.apply(GET_TERMS, &QueriedObject::Other, &json!({"having_images": "yes"})),
            Err(FilterError::InvalidArgs { .. })
        ));
        assert_eq!(FILTER_NAMES.len(), 8);
    }
}
