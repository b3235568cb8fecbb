//! Request context
//!
//! Everything that used to be process-wide state (the image type
//! registry, resolved identifiers, the legacy table, settings) lives in a
//! [`RequestContext`] built when a request begins and dropped when it
//! ends. Components receive it explicitly.

use crate::config::TaxonomyImagesConfig;
use crate::diagnostics::Diagnostics;
use crate::error::SettingsError;
use crate::facade::TermImages;
use crate::host::Host;
use crate::image_types::{ImageTypeDescriptor, ImageTypeRegistry};
use crate::resolver::IdentifierResolver;
use crate::settings::{Settings, SettingsNotice};
use crate::store::{select_store, Backend, LegacyAssociations};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Per-request state
pub struct RequestContext {
    host: Arc<dyn Host>,
    config: TaxonomyImagesConfig,
    resolver: Arc<IdentifierResolver>,
    legacy: Arc<LegacyAssociations>,
    images: TermImages,
    image_types: ImageTypeRegistry,
    settings: RwLock<Settings>,
    diagnostics: Diagnostics,
}

/// Builder for [`RequestContext`]
pub struct RequestContextBuilder {
    host: Arc<dyn Host>,
    config: TaxonomyImagesConfig,
    extra_types: Vec<ImageTypeDescriptor>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("backend", &self.backend())
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("image_types", &self.image_types.len())
            .field("settings", &*self.settings.read())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for RequestContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContextBuilder")
            .field("config", &self.config)
            .field("extra_types", &self.extra_types)
            .finish_non_exhaustive()
    }
}

impl RequestContextBuilder {
    /// Register an extension image type
    #[inline]
    #[must_use]
    pub fn with_image_type(mut self, descriptor: ImageTypeDescriptor) -> Self {
        self.extra_types.push(descriptor);
        self
    }

    /// Register several extension image types
    #[must_use]
    pub fn with_image_types(mut self, descriptors: impl IntoIterator<Item = ImageTypeDescriptor>) -> Self {
        self.extra_types.extend(descriptors);
        self
    }

    /// Detect capabilities, select the store and load settings
    #[must_use]
    pub fn build(self) -> RequestContext {
        let Self {
            host,
            config,
            extra_types,
        } = self;

        let resolver = Arc::new(IdentifierResolver::new(Arc::clone(&host)));
        let legacy = Arc::new(LegacyAssociations::new(
            Arc::clone(&host),
            config.legacy_option_key.clone(),
        ));
        let store = select_store(&host, &config, &legacy);
        let images = TermImages::new(Arc::clone(&resolver), Arc::from(store));
        let settings = Settings::load(host.as_ref(), &config.settings_option_key);
        let diagnostics = Diagnostics::new(config.debug);

        tracing::debug!(
            backend = %images.backend(),
            enabled_taxonomies = settings.taxonomies.len(),
            "request context started"
        );

        RequestContext {
            host,
            config,
            resolver,
            legacy,
            images,
            image_types: ImageTypeRegistry::with_extra(extra_types),
            settings: RwLock::new(settings),
            diagnostics,
        }
    }
}

impl RequestContext {
    /// Start building a context
    #[must_use]
    pub fn builder(host: Arc<dyn Host>, config: TaxonomyImagesConfig) -> RequestContextBuilder {
        RequestContextBuilder {
            host,
            config,
            extra_types: Vec::new(),
        }
    }

    /// Begin a request with only the featured image type
    #[must_use]
    pub fn begin(host: Arc<dyn Host>, config: TaxonomyImagesConfig) -> Self {
        Self::builder(host, config).build()
    }

    /// Association facade
    #[inline]
    #[must_use]
    pub fn images(&self) -> &TermImages {
        &self.images
    }

    /// Active backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.images.backend()
    }

    /// Host handle
    #[inline]
    #[must_use]
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TaxonomyImagesConfig {
        &self.config
    }

    /// Identifier resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &IdentifierResolver {
        &self.resolver
    }

    /// Legacy table accessor
    #[inline]
    #[must_use]
    pub fn legacy(&self) -> &LegacyAssociations {
        &self.legacy
    }

    /// Image type registry
    #[inline]
    #[must_use]
    pub fn image_types(&self) -> &ImageTypeRegistry {
        &self.image_types
    }

    /// Settings as loaded (or last saved) in this request
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Check if a taxonomy has image support
    #[must_use]
    pub fn has_image_support(&self, taxonomy: &str) -> bool {
        self.settings.read().has_image_support(taxonomy)
    }

    /// Sanitize and persist submitted settings
    ///
    /// # Errors
    /// Returns error if the submission is malformed or cannot be saved
    pub fn save_settings(&self, dirty: &Value) -> Result<SettingsNotice, SettingsError> {
        let (clean, notice) = Settings::sanitize(dirty, self.host.as_ref())?;
        clean.save(self.host.as_ref(), &self.config.settings_option_key)?;
        *self.settings.write() = clean;
        Ok(notice)
    }

    /// Debug diagnostics sink
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// End the request, dropping every cache
    pub fn end(self) {
        tracing::debug!(
            resolved = self.resolver.cached(),
            diagnostics = self.diagnostics.emitted(),
            "request context ended"
        );
    }
}

/// Activation: persist empty records for anything never written
///
/// Returns `true` if something was created. Safe to call repeatedly.
///
/// # Errors
/// Returns error if the host cannot persist an option
pub fn install(host: &Arc<dyn Host>, config: &TaxonomyImagesConfig) -> Result<bool, SettingsError> {
    let legacy = LegacyAssociations::new(Arc::clone(host), config.legacy_option_key.clone());
    let created_table = legacy.ensure_initialized()?;
    let created_settings = Settings::ensure_initialized(host.as_ref(), &config.settings_option_key)?;
    tracing::info!(created_table, created_settings, "installed taxonomy images");
    Ok(created_table || created_settings)
}
