//! In-process provider registry with direct and late-bound entries.
//!
//! # Invariants
//! - Entries are append-only; nothing is removed once registered.
//! - Provider ids are unique and match `[a-z0-9_-]+`.
//! - Named entries are resolved through the factory table only when the
//!   importer asks for them, so factories may be registered after the entry.

use crate::sync::provider::ResidentProvider;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Constructor for a late-bound provider.
pub type ProviderFactory = Arc<dyn Fn() -> Arc<dyn ResidentProvider> + Send + Sync>;

/// How the registry reaches one provider.
#[derive(Clone)]
pub enum ProviderRef {
    /// Already constructed provider handle.
    Direct(Arc<dyn ResidentProvider>),
    /// Factory name resolved lazily at import time.
    Named(String),
}

impl Debug for ProviderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(provider) => f
                .debug_tuple("Direct")
                .field(&provider.provider_id())
                .finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// One enumerated registry entry.
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub provider_id: String,
    pub reference: ProviderRef,
}

/// Provider registration/resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRegistryError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
    DuplicateFactory(String),
    UnknownFactory(String),
}

impl Display for ProviderRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
            Self::DuplicateFactory(value) => {
                write!(f, "provider factory already registered: {value}")
            }
            Self::UnknownFactory(value) => write!(f, "provider factory not found: {value}"),
        }
    }
}

impl Error for ProviderRegistryError {}

/// Catalog of every provider the importer should run.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderRef>,
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one constructed provider under its own id.
    pub fn register(
        &mut self,
        provider: Arc<dyn ResidentProvider>,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = provider.provider_id().to_string();
        self.insert_entry(provider_id, ProviderRef::Direct(provider))
    }

    /// Registers a provider id that resolves through `factory_name` on use.
    pub fn register_named(
        &mut self,
        provider_id: &str,
        factory_name: &str,
    ) -> Result<(), ProviderRegistryError> {
        self.insert_entry(
            provider_id.to_string(),
            ProviderRef::Named(factory_name.trim().to_string()),
        )
    }

    /// Adds one factory to the late-binding table.
    pub fn register_factory(
        &mut self,
        factory_name: &str,
        factory: ProviderFactory,
    ) -> Result<(), ProviderRegistryError> {
        let factory_name = factory_name.trim().to_string();
        if factory_name.is_empty() {
            return Err(ProviderRegistryError::InvalidProviderId(factory_name));
        }
        if self.factories.contains_key(factory_name.as_str()) {
            return Err(ProviderRegistryError::DuplicateFactory(factory_name));
        }
        self.factories.insert(factory_name, factory);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns sorted provider ids.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Enumerates all known providers in id order.
    pub fn entries(&self) -> Vec<ProviderEntry> {
        self.providers
            .iter()
            .map(|(provider_id, reference)| ProviderEntry {
                provider_id: provider_id.clone(),
                reference: reference.clone(),
            })
            .collect()
    }

    /// Returns one entry by id.
    pub fn get(&self, provider_id: &str) -> Option<&ProviderRef> {
        self.providers.get(provider_id.trim())
    }

    /// Turns either reference kind into a callable provider.
    pub fn resolve(
        &self,
        reference: &ProviderRef,
    ) -> Result<Arc<dyn ResidentProvider>, ProviderRegistryError> {
        match reference {
            ProviderRef::Direct(provider) => Ok(Arc::clone(provider)),
            ProviderRef::Named(factory_name) => self
                .factories
                .get(factory_name.as_str())
                .map(|factory| factory())
                .ok_or_else(|| ProviderRegistryError::UnknownFactory(factory_name.clone())),
        }
    }

    fn insert_entry(
        &mut self,
        provider_id: String,
        reference: ProviderRef,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = provider_id.trim().to_string();
        if !is_valid_provider_id(&provider_id) {
            return Err(ProviderRegistryError::InvalidProviderId(provider_id));
        }
        if self.providers.contains_key(provider_id.as_str()) {
            return Err(ProviderRegistryError::DuplicateProviderId(provider_id));
        }

        self.providers.insert(provider_id, reference);
        Ok(())
    }
}

fn is_valid_provider_id(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{ProviderRef, ProviderRegistry, ProviderRegistryError};
    use crate::sync::provider::{ProviderRecord, ProviderResult, ResidentProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    impl std::fmt::Debug for dyn ResidentProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ResidentProvider")
                .field("provider_id", &self.provider_id())
                .finish()
        }
    }

    struct MockProvider {
        provider_id: String,
    }

    impl MockProvider {
        fn new(provider_id: &str) -> Self {
            Self {
                provider_id: provider_id.to_string(),
            }
        }
    }

    impl ResidentProvider for MockProvider {
        fn provider_id(&self) -> &str {
            &self.provider_id
        }

        fn fetch(&self) -> ProviderResult<Vec<ProviderRecord>> {
            Ok(vec![])
        }
    }

    #[test]
    fn registers_direct_provider() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::new("yardi")))
            .expect("provider should register");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.provider_ids(), vec!["yardi".to_string()]);
        assert!(matches!(registry.get("yardi"), Some(ProviderRef::Direct(_))));
    }

    #[test]
    fn rejects_invalid_or_duplicate_provider_id() {
        let mut registry = ProviderRegistry::new();
        let invalid = registry.register(Arc::new(MockProvider::new("Real Page")));
        assert!(matches!(
            invalid,
            Err(ProviderRegistryError::InvalidProviderId(_))
        ));
        let blank = registry.register_named("   ", "snapshot");
        assert!(matches!(
            blank,
            Err(ProviderRegistryError::InvalidProviderId(_))
        ));

        registry
            .register(Arc::new(MockProvider::new("yardi")))
            .expect("first provider should register");
        let duplicate = registry.register_named("yardi", "snapshot");
        assert!(matches!(
            duplicate,
            Err(ProviderRegistryError::DuplicateProviderId(_))
        ));
    }

    #[test]
    fn entries_are_sorted_by_provider_id() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::new("realpage")))
            .expect("realpage should register");
        registry
            .register_named("appfolio", "appfolio_factory")
            .expect("appfolio should register");

        let ids: Vec<String> = registry
            .entries()
            .into_iter()
            .map(|entry| entry.provider_id)
            .collect();
        assert_eq!(ids, vec!["appfolio".to_string(), "realpage".to_string()]);
    }

    #[test]
    fn named_entries_resolve_lazily_through_factory() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry
            .register_named("nightly", "nightly_factory")
            .expect("named entry should register before its factory");

        let counter = Arc::clone(&constructed);
        registry
            .register_factory(
                "nightly_factory",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Arc::new(MockProvider::new("nightly")) as Arc<dyn ResidentProvider>
                }),
            )
            .expect("factory should register");
        assert_eq!(constructed.load(Ordering::SeqCst), 0);

        let reference = registry.get("nightly").expect("entry exists").clone();
        let provider = registry.resolve(&reference).expect("named ref should resolve");
        assert_eq!(provider.provider_id(), "nightly");
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolving_unknown_factory_fails() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_named("ghost", "missing_factory")
            .expect("entry should register");
        let reference = registry.get("ghost").expect("entry exists").clone();
        let err = registry
            .resolve(&reference)
            .expect_err("unknown factory must not resolve");
        assert_eq!(
            err,
            ProviderRegistryError::UnknownFactory("missing_factory".to_string())
        );
    }

    #[test]
    fn rejects_duplicate_factory_name() {
        let mut registry = ProviderRegistry::new();
        let factory = || Arc::new(MockProvider::new("a")) as Arc<dyn ResidentProvider>;
        registry
            .register_factory("shared", Arc::new(factory))
            .expect("first factory should register");
        let err = registry
            .register_factory("shared", Arc::new(factory))
            .expect_err("duplicate factory must fail");
        assert_eq!(
            err,
            ProviderRegistryError::DuplicateFactory("shared".to_string())
        );
    }

    #[test]
    fn get_trims_input_and_returns_none_for_blank_value() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::new("yardi")))
            .expect("provider should register");

        assert!(registry.get("  yardi  ").is_some());
        assert!(registry.get("   ").is_none());
    }
}
