//! Named arguments accepted by the accessors
//!
//! Every field is optional on the wire; missing fields take the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ti_core::PostId;

const DEFAULT_TAXONOMY: &str = "category";
const DEFAULT_SIZE: &str = "thumbnail";

/// Arguments of `taxonomy-images-get-terms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetTermsArgs {
    /// Comma separated taxonomy names
    pub taxonomy: String,
    /// Return only terms with an image, if any have one
    pub having_images: bool,
    /// Prime the host attachment cache with the images found
    pub cache_images: bool,
}

impl Default for GetTermsArgs {
    fn default() -> Self {
        Self {
            taxonomy: DEFAULT_TAXONOMY.to_string(),
            having_images: true,
            cache_images: true,
        }
    }
}

impl GetTermsArgs {
    /// Taxonomy names, trimmed
    #[must_use]
    pub fn taxonomies(&self) -> Vec<String> {
        self.taxonomy
            .split(',')
            .map(|t| t.trim().to_string())
            .collect()
    }
}

/// Arguments of `taxonomy-images-get-the-terms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetTheTermsArgs {
    /// Post whose terms are listed; the current post if absent
    pub post_id: Option<PostId>,
    /// Taxonomy name
    pub taxonomy: String,
    /// Return only terms with an image, if any have one
    pub having_images: bool,
}

impl Default for GetTheTermsArgs {
    fn default() -> Self {
        Self {
            post_id: None,
            taxonomy: DEFAULT_TAXONOMY.to_string(),
            having_images: true,
        }
    }
}

/// Arguments of `taxonomy-images-list-the-terms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTheTermsArgs {
    /// Markup before the list
    pub before: String,
    /// Markup after the list
    pub after: String,
    /// Markup before each image
    pub before_image: String,
    /// Markup after each image
    pub after_image: String,
    /// Registered image size
    pub image_size: String,
    /// Post whose terms are listed; the current post if absent
    pub post_id: Option<PostId>,
    /// Taxonomy name
    pub taxonomy: String,
}

impl Default for ListTheTermsArgs {
    fn default() -> Self {
        Self {
            before: "<ul class=\"taxonomy-images-the-terms\">".to_string(),
            after: "</ul>".to_string(),
            before_image: "<li>".to_string(),
            after_image: "</li>".to_string(),
            image_size: DEFAULT_SIZE.to_string(),
            post_id: None,
            taxonomy: DEFAULT_TAXONOMY.to_string(),
        }
    }
}

/// Arguments of `taxonomy-images-queried-term-image`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueriedImageArgs {
    /// Markup before the image
    pub before: String,
    /// Markup after the image
    pub after: String,
    /// Registered image size
    pub image_size: String,
    /// Extra attributes on the image tag
    pub attr: BTreeMap<String, String>,
}

impl Default for QueriedImageArgs {
    fn default() -> Self {
        Self {
            before: String::new(),
            after: String::new(),
            image_size: DEFAULT_SIZE.to_string(),
            attr: BTreeMap::new(),
        }
    }
}

/// Arguments of the image data and URL accessors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSizeArgs {
    /// Registered image size; `full` or `fullsize` for the original
    pub image_size: String,
}

impl Default for ImageSizeArgs {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_SIZE.to_string(),
        }
    }
}

impl ImageSizeArgs {
    /// Args for a size
    #[must_use]
    pub fn new(image_size: &str) -> Self {
        Self {
            image_size: image_size.to_string(),
        }
    }

    /// Check if the original upload is wanted
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self.image_size.as_str(), "full" | "fullsize")
    }
}
