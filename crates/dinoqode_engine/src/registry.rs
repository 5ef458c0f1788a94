use std::sync::Arc;

use dinoqode_core::{validate, ExtractedRecord, ItemKind};
use dinoqode_logging::{dq_debug, dq_info, dq_warn};
use regex::Regex;

use crate::extract::{
    AldiLifeStrategy, AmazonMusicStrategy, AppleMusicStrategy, ExtractionStrategy,
    SpotifyStrategy,
};
use crate::page::PageContext;
use crate::types::{ExtractionError, RegistryError};

/// A supported service: its name, the URL pattern that identifies it, and the
/// strategy that reads its pages.
#[derive(Clone)]
pub struct ServiceAdapter {
    name: String,
    url_pattern: Regex,
    strategy: Arc<dyn ExtractionStrategy>,
}

impl ServiceAdapter {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered list of service adapters. The first adapter whose pattern matches
/// the page URL wins.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    adapters: Vec<ServiceAdapter>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in service. `napster` shares the ALDI life
    /// strategy since both storefronts render the same markup.
    pub fn with_default_services() -> Self {
        let aldi: Arc<dyn ExtractionStrategy> = Arc::new(AldiLifeStrategy);
        let mut registry = Self::new();
        let builtins: [(&str, &str, Arc<dyn ExtractionStrategy>); 5] = [
            ("amazonmusic", r"music\.amazon\.", Arc::new(AmazonMusicStrategy)),
            ("applemusic", r"\.apple\.com", Arc::new(AppleMusicStrategy)),
            ("spotify", r"\.spotify\.com", Arc::new(SpotifyStrategy)),
            ("aldilife", r"\.lifestore-flat\.de", aldi.clone()),
            ("napster", r"\.napster\.com", aldi),
        ];
        for (name, pattern, strategy) in builtins {
            if let Err(err) = registry.register(name, pattern, strategy) {
                dq_warn!("Skipping built-in service {}: {}", name, err);
            }
        }
        registry
    }

    /// Appends an adapter. Names must be unique.
    pub fn register(
        &mut self,
        name: &str,
        url_pattern: &str,
        strategy: Arc<dyn ExtractionStrategy>,
    ) -> Result<&mut Self, RegistryError> {
        if self.adapters.iter().any(|a| a.name == name) {
            return Err(RegistryError::DuplicateService(name.to_string()));
        }
        let url_pattern = Regex::new(url_pattern).map_err(|err| RegistryError::InvalidPattern {
            service: name.to_string(),
            message: err.to_string(),
        })?;
        self.adapters.push(ServiceAdapter {
            name: name.to_string(),
            url_pattern,
            strategy,
        });
        Ok(self)
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.name.as_str())
    }

    /// First adapter whose pattern matches `url`.
    pub fn resolve_service(&self, url: &str) -> Option<&ServiceAdapter> {
        self.adapters.iter().find(|a| a.url_pattern.is_match(url))
    }

    /// Resolves the page's service, runs its strategy and validates the result.
    pub fn extract(
        &self,
        page: &PageContext,
        item_kind: ItemKind,
    ) -> Result<ExtractedRecord, ExtractionError> {
        let url = page.url().as_str();
        let adapter = self
            .resolve_service(url)
            .ok_or_else(|| ExtractionError::UnknownService {
                url: url.to_string(),
            })?;
        dq_debug!("Resolved {} to service {}", url, adapter.name);

        let partial = adapter.strategy.extract(page);
        let record = validate(&adapter.name, item_kind, partial).map_err(|err| {
            dq_warn!("Extraction from {} failed: {}", url, err);
            ExtractionError::Validation {
                service: adapter.name.clone(),
                source: err,
            }
        })?;
        dq_info!("Extracted {} {} {}", record.service, record.item_kind, record.id);
        Ok(record)
    }
}
