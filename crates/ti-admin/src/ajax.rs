//! AJAX endpoints
//!
//! Both endpoints run their checks in a fixed order and stop at the
//! first failure:
//!
//! 1. term id present and positive
//! 2. anti-replay token present, valid for the action and actor (consumed)
//! 3. actor may edit terms of the term's taxonomy
//! 4. image type registered for that taxonomy
//! 5. attachment id present and positive (update only)
//! 6. mutation
//!
//! Every outcome becomes an [`AjaxResponse`]; nothing escapes as an error.

use crate::error::AjaxError;
use crate::nonce::{NonceAction, NonceIssuer};
use crate::url::{PreviewStrategy, TermImageUrl};
use serde::{Deserialize, Serialize};
use ti_core::{AttachmentId, ImageType, RequestContext, StoreError, TermId, TermRef};

/// Submitted form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AjaxRequest {
    /// Term primary identifier
    pub term_id: Option<String>,
    /// Anti-replay token
    pub wp_nonce: Option<String>,
    /// Attachment to associate (update only)
    pub attachment_id: Option<String>,
    /// Taxonomy, to disambiguate a shared term id
    pub taxonomy: Option<String>,
    /// Image type; empty or absent means the featured image
    pub image_type: Option<String>,
}

impl AjaxRequest {
    /// Request for a term id with a token
    #[must_use]
    pub fn new(term_id: u64, nonce: impl Into<String>) -> Self {
        Self {
            term_id: Some(term_id.to_string()),
            wp_nonce: Some(nonce.into()),
            ..Self::default()
        }
    }

    /// With attachment id field
    #[inline]
    #[must_use]
    pub fn with_attachment(mut self, attachment_id: impl Into<String>) -> Self {
        self.attachment_id = Some(attachment_id.into());
        self
    }

    /// With taxonomy field
    #[inline]
    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: impl Into<String>) -> Self {
        self.taxonomy = Some(taxonomy.into());
        self
    }

    /// With image type field
    #[inline]
    #[must_use]
    pub fn with_image_type(mut self, image_type: impl Into<String>) -> Self {
        self.image_type = Some(image_type.into());
        self
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AjaxStatus {
    /// Request succeeded
    Good,
    /// Request was rejected or failed
    Bad,
}

/// Discriminated endpoint result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxResponse {
    /// Outcome
    pub status: AjaxStatus,
    /// Human readable reason
    pub why: String,
    /// Preview URL of the new image, empty unless an image was associated
    #[serde(default)]
    pub attachment_thumb_src: String,
}

impl AjaxResponse {
    fn good(why: &str, attachment_thumb_src: String) -> Self {
        Self {
            status: AjaxStatus::Good,
            why: why.to_string(),
            attachment_thumb_src,
        }
    }

    /// Check for success
    #[inline]
    #[must_use]
    pub fn is_good(&self) -> bool {
        self.status == AjaxStatus::Good
    }
}

impl From<AjaxError> for AjaxResponse {
    fn from(err: AjaxError) -> Self {
        Self {
            status: AjaxStatus::Bad,
            why: err.to_string(),
            attachment_thumb_src: String::new(),
        }
    }
}

/// Endpoint handlers for one request
#[derive(Debug, Clone, Copy)]
pub struct AjaxHandler<'a> {
    context: &'a RequestContext,
    nonces: &'a NonceIssuer,
    actor: &'a str,
}

impl<'a> AjaxHandler<'a> {
    /// Create handler acting as `actor`
    #[inline]
    #[must_use]
    pub fn new(context: &'a RequestContext, nonces: &'a NonceIssuer, actor: &'a str) -> Self {
        Self {
            context,
            nonces,
            actor,
        }
    }

    /// Associate an image with a term
    #[must_use]
    pub fn update_term_image(&self, request: &AjaxRequest) -> AjaxResponse {
        match self.try_update(request) {
            Ok(src) => AjaxResponse::good("Image successfully associated", src),
            Err(err) => self.reject("update_term_image", err),
        }
    }

    /// Remove a term's image
    #[must_use]
    pub fn delete_term_image(&self, request: &AjaxRequest) -> AjaxResponse {
        match self.try_delete(request) {
            Ok(()) => AjaxResponse::good("Association successfully removed", String::new()),
            Err(err) => self.reject("delete_term_image", err),
        }
    }

    fn try_update(&self, request: &AjaxRequest) -> Result<String, AjaxError> {
        let (term, image_type) = self.authorize(request, NonceAction::CreateAssociation)?;
        let attachment = request
            .attachment_id
            .as_deref()
            .ok_or(AjaxError::ImageIdMissing)?;
        let attachment = parse_positive(attachment)
            .and_then(AttachmentId::new)
            .ok_or(AjaxError::ImageIdInvalid)?;

        self.context
            .images()
            .set_image(&term, attachment, &image_type)
            .map_err(|err| classify(err, AjaxError::CreateFailed))?;

        let urls = TermImageUrl::new(self.context, PreviewStrategy::Admin);
        Ok(urls
            .attachment_url(attachment)
            .unwrap_or_else(|| urls.placeholder()))
    }

    fn try_delete(&self, request: &AjaxRequest) -> Result<(), AjaxError> {
        let (term, image_type) = self.authorize(request, NonceAction::RemoveAssociation)?;
        self.context
            .images()
            .delete_image(&term, &image_type)
            .map_err(|err| classify(err, AjaxError::RemoveFailed))?;
        Ok(())
    }

    /// Checks shared by both endpoints, in order
    fn authorize(
        &self,
        request: &AjaxRequest,
        action: NonceAction,
    ) -> Result<(TermRef, ImageType), AjaxError> {
        let term_id = request.term_id.as_deref().ok_or(AjaxError::TermIdMissing)?;
        let term_id = parse_positive(term_id).ok_or(AjaxError::TermIdEmpty)?;

        let nonce = request.wp_nonce.as_deref().ok_or(AjaxError::NonceMissing)?;
        self.nonces
            .verify(nonce, action, self.actor)
            .map_err(AjaxError::NonceMismatch)?;

        let taxonomy = request.taxonomy.as_deref().filter(|t| !t.is_empty());
        let term = TermRef::with_hint(TermId(term_id), taxonomy);
        let owner = self.context.images().get_taxonomy(&term);
        if owner.is_empty() || !self.context.host().can_edit_terms(&owner) {
            return Err(AjaxError::Capability);
        }

        let image_type = image_type(request);
        let registered = self
            .context
            .image_types()
            .get(&image_type)
            .is_some_and(|descriptor| descriptor.supports_taxonomy(&owner));
        if !registered {
            return Err(AjaxError::UnknownImageType(image_type));
        }
        Ok((term, image_type))
    }

    fn reject(&self, endpoint: &str, err: AjaxError) -> AjaxResponse {
        tracing::warn!(endpoint, actor = self.actor, reason = %err, "ajax request rejected");
        err.into()
    }
}

fn image_type(request: &AjaxRequest) -> ImageType {
    request
        .image_type
        .as_deref()
        .map_or_else(ImageType::featured, ImageType::new)
}

fn classify(err: StoreError, otherwise: fn(StoreError) -> AjaxError) -> AjaxError {
    if err.is_ambiguous() {
        AjaxError::AmbiguousTerm(err)
    } else {
        otherwise(err)
    }
}

/// Positive integer from a form field
fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
