//! Process-wide table of available filter frameworks.
//!
//! Each framework module registers itself exactly once when it is loaded and
//! unregisters exactly once when it is unloaded. Filter instances never touch
//! the registry; they are created from it and then live independently.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::error::RegistryError;
use crate::framework::{FilterFramework, FrameworkInfo};

/// Creates a fresh, unconfigured filter instance.
pub type FrameworkFactory = fn() -> Box<dyn FilterFramework>;

#[derive(Clone, Copy)]
struct Registration {
    info: &'static FrameworkInfo,
    factory: FrameworkFactory,
}

#[derive(Default)]
pub struct FilterRegistry {
    entries: Mutex<HashMap<&'static str, Registration>>,
}

static GLOBAL: Lazy<FilterRegistry> = Lazy::new(FilterRegistry::new);

/// The registry shared by the whole process.
pub fn global() -> &'static FilterRegistry {
    &GLOBAL
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<&'static str, Registration>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a framework under `info.name`.
    ///
    /// # Errors
    /// `AlreadyRegistered` if the name is taken and was not unregistered.
    pub fn register(
        &self,
        info: &'static FrameworkInfo,
        factory: FrameworkFactory,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries();
        if entries.contains_key(info.name) {
            return Err(RegistryError::AlreadyRegistered(info.name.to_string()));
        }
        entries.insert(info.name, Registration { info, factory });
        tracing::info!(framework = info.name, "framework registered");
        Ok(())
    }

    /// Remove a framework registered earlier.
    ///
    /// # Errors
    /// `NotRegistered` if there is no matching registration.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        match self.entries().remove(name) {
            Some(_) => {
                tracing::info!(framework = name, "framework unregistered");
                Ok(())
            }
            None => Err(RegistryError::NotRegistered(name.to_string())),
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<&'static FrameworkInfo> {
        self.entries().get(name).map(|r| r.info)
    }

    /// Registered framework names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Create a new, unconfigured instance of the named framework.
    pub fn create(&self, name: &str) -> Result<Box<dyn FilterFramework>, RegistryError> {
        let registration = self
            .entries()
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        Ok((registration.factory)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{NfmFilter, FRAMEWORK_INFO, FRAMEWORK_NAME};
    use crate::framework::FilterState;

    #[test]
    fn test_register_once() {
        let registry = FilterRegistry::new();
        NfmFilter::register(&registry).unwrap();
        assert!(registry.is_registered(FRAMEWORK_NAME));
        assert_eq!(
            NfmFilter::register(&registry),
            Err(RegistryError::AlreadyRegistered(FRAMEWORK_NAME.to_string()))
        );
        assert_eq!(registry.names(), vec![FRAMEWORK_NAME]);
    }

    #[test]
    fn test_unregister_requires_registration() {
        let registry = FilterRegistry::new();
        assert_eq!(
            registry.unregister(FRAMEWORK_NAME),
            Err(RegistryError::NotRegistered(FRAMEWORK_NAME.to_string()))
        );
        NfmFilter::register(&registry).unwrap();
        NfmFilter::unregister(&registry).unwrap();
        assert!(!registry.is_registered(FRAMEWORK_NAME));
        assert!(NfmFilter::unregister(&registry).is_err());
        // A fresh registration is allowed after unregistering.
        NfmFilter::register(&registry).unwrap();
    }

    #[test]
    fn test_create_by_name() {
        let registry = FilterRegistry::new();
        assert!(registry.create(FRAMEWORK_NAME).is_err());
        NfmFilter::register(&registry).unwrap();

        let filter = registry.create(FRAMEWORK_NAME).unwrap();
        assert_eq!(filter.state(), FilterState::Empty);
        assert_eq!(filter.info(), &FRAMEWORK_INFO);
        assert_eq!(registry.info(FRAMEWORK_NAME), Some(&FRAMEWORK_INFO));
        assert!(registry.info("tensorflow-lite").is_none());
    }
}
