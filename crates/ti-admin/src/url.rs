//! Preview URL resolution
//!
//! One lookup chain, two behaviours selected by [`PreviewStrategy`]:
//! the admin preview cleans up associations whose image is gone and
//! shows the "no image" placeholder, the public preview leaves data
//! alone and falls back to a transparent placeholder.

use ti_core::{AttachmentId, ImageType, RequestContext, TermRef};

/// How an unresolvable image is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewStrategy {
    /// Term edit screens
    #[default]
    Admin,
    /// Front end
    Public,
}

/// Resolves the preview URL of a term image
#[derive(Debug, Clone, Copy)]
pub struct TermImageUrl<'a> {
    context: &'a RequestContext,
    strategy: PreviewStrategy,
}

impl<'a> TermImageUrl<'a> {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new(context: &'a RequestContext, strategy: PreviewStrategy) -> Self {
        Self { context, strategy }
    }

    /// Preview URL for a term's image, or the strategy's placeholder
    ///
    /// The admin strategy deletes an association whose attachment no
    /// longer resolves at any size.
    #[must_use]
    pub fn url(&self, term: &TermRef, image_type: &ImageType) -> String {
        let Some(attachment) = self.context.images().get_image_id(term, image_type) else {
            return self.placeholder();
        };
        if let Some(url) = self.attachment_url(attachment) {
            return url;
        }

        if self.strategy == PreviewStrategy::Admin {
            tracing::info!(%term, attachment_id = attachment.get(), "removing association to missing image");
            if let Err(err) = self.context.images().delete_image(term, image_type) {
                tracing::warn!(%term, error = %err, "could not remove dangling association");
            }
        }
        self.placeholder()
    }

    /// First source found: detail size, generated detail size, thumbnail, original
    #[must_use]
    pub fn attachment_url(&self, attachment: AttachmentId) -> Option<String> {
        let media = self.context.host();
        let detail = &self.context.config().detail_size;

        media
            .intermediate_src(attachment, &detail.name)
            .or_else(|| media.generate_intermediate(attachment, detail))
            .or_else(|| media.intermediate_src(attachment, "thumbnail"))
            .or_else(|| media.full_src(attachment))
            .map(|src| src.url)
    }

    /// Placeholder for this strategy
    #[must_use]
    pub fn placeholder(&self) -> String {
        match self.strategy {
            PreviewStrategy::Admin => self.context.config().default_image_url(),
            PreviewStrategy::Public => self.context.config().blank_image_url(),
        }
    }
}
