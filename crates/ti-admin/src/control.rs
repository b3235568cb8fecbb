//! Term list and edit screen controls

use crate::nonce::{NonceAction, NonceIssuer};
use crate::url::{PreviewStrategy, TermImageUrl};
use serde::Serialize;
use std::fmt::Write as _;
use ti_core::html::{escape, escape_url};
use ti_core::{ImageType, RequestContext, Settings, TaxonomyInfo, TermRecord, TermRef};

/// Column key of the term list image column
pub const IMAGE_COLUMN: &str = "taxonomy_image_plugin";

/// View model of the image control for one term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageControl {
    /// Primary identifier
    pub term_id: u64,
    /// Term display name
    pub term_name: String,
    /// Associated attachment, 0 if none
    pub attachment_id: u64,
    /// Preview URL or placeholder
    pub src: String,
    /// Token for the create endpoint
    pub create_nonce: String,
    /// Token for the remove endpoint
    pub remove_nonce: String,
    /// Hide the remove link
    pub remove_hidden: bool,
    /// Lowercased singular taxonomy label
    pub singular_name: String,
}

impl ImageControl {
    /// Build the control for a term
    #[must_use]
    pub fn for_term(
        context: &RequestContext,
        nonces: &NonceIssuer,
        actor: &str,
        term: &TermRecord,
        image_type: &ImageType,
    ) -> Self {
        let term_ref = TermRef::resolved(term.term_id.0, term.taxonomy.clone());
        let urls = TermImageUrl::new(context, PreviewStrategy::Admin);
        let src = urls.url(&term_ref, image_type);
        // Read after the preview: the preview may have removed a dangling association
        let attachment_id = context
            .images()
            .get_image_id(&term_ref, image_type)
            .map_or(0, |id| id.get());

        Self {
            term_id: term.term_id.0,
            term_name: term.name.clone(),
            attachment_id,
            src,
            create_nonce: nonces.issue(NonceAction::CreateAssociation, actor),
            remove_nonce: nonces.issue(NonceAction::RemoveAssociation, actor),
            remove_hidden: attachment_id == 0,
            singular_name: singular_name(context.host().taxonomy(&term.taxonomy).as_ref()),
        }
    }

    /// Render the control markup
    #[must_use]
    pub fn render(&self) -> String {
        let id = self.term_id;
        let common = format!("data-term-id=\"{id}\" data-attachment-id=\"{}\"", self.attachment_id);
        let library = "media-upload.php?type=image&amp;tab=library&amp;post_id=0&amp;TB_iframe=true";
        let upload = "media-upload.php?type=image&amp;tab=type&amp;post_id=0&amp;TB_iframe=true";
        let hide = if self.remove_hidden { " hide" } else { "" };

        let mut html = String::new();
        let _ = write!(
            html,
            "<div id=\"taxonomy-image-control-{id}\" class=\"taxonomy-image-control hide-if-no-js\">"
        );
        let _ = write!(
            html,
            "<a {common} data-nonce=\"{nonce}\" class=\"taxonomy-image-thumbnail\" href=\"{library}\" title=\"{title}\">\
             <img id=\"taxonomy_image_plugin_{id}\" src=\"{src}\" alt=\"\" /></a>",
            nonce = self.create_nonce,
            title = escape(&format!(
                "Associate an image with the {} named \u{201c}{}\u{201d}.",
                self.singular_name, self.term_name
            )),
            src = escape_url(&self.src),
        );
        let _ = write!(
            html,
            "<a {common} data-nonce=\"{nonce}\" class=\"control upload\" href=\"{upload}\" title=\"{title}\">Upload</a>",
            nonce = self.create_nonce,
            title = escape(&format!("Upload a new image for this {}.", self.singular_name)),
        );
        let _ = write!(
            html,
            "<a {common} data-nonce=\"{nonce}\" class=\"control remove{hide}\" href=\"#\" title=\"{title}\" id=\"remove-{id}\">Delete</a>",
            nonce = self.remove_nonce,
            title = escape(&format!("Remove image from this {}.", self.singular_name)),
        );
        html.push_str("</div>");
        html
    }

    /// Help text shown under the control on the edit screen
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Associate an image from your media library to this {}.",
            self.singular_name
        )
    }
}

fn singular_name(taxonomy: Option<&TaxonomyInfo>) -> String {
    taxonomy
        .map(|t| t.singular_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or("Term")
        .to_lowercase()
}

/// Insert the image column after the first column
#[must_use]
pub fn taxonomy_columns(columns: &[(String, String)]) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(columns.len() + 1);
    let mut rest = columns.iter().filter(|(key, _)| key != IMAGE_COLUMN);
    if let Some(first) = rest.next() {
        out.push(first.clone());
    }
    out.push((IMAGE_COLUMN.to_string(), "Image".to_string()));
    out.extend(rest.cloned());
    out
}

/// Append the control to a term list row when rendering the image column
#[must_use]
pub fn term_row(
    context: &RequestContext,
    nonces: &NonceIssuer,
    actor: &str,
    row: &str,
    column: &str,
    term: &TermRecord,
) -> String {
    if column != IMAGE_COLUMN {
        return row.to_string();
    }
    let control = ImageControl::for_term(context, nonces, actor, term, &ImageType::featured());
    format!("{row}{}", control.render())
}

/// Taxonomies whose admin screens get the control
#[must_use]
pub fn enabled_taxonomies(context: &RequestContext, settings: &Settings) -> Vec<TaxonomyInfo> {
    let host = context.host();
    settings
        .taxonomies
        .iter()
        .filter_map(|name| host.taxonomy(name))
        .collect()
}
