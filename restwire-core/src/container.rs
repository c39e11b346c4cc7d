//! Singleton container: named registrations kept in declaration order, resolved by name or type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::endpoint::EndpointProvider;
use crate::qualifier::Qualifier;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("no registration for {0}")]
    NotFound(String),
    #[error("registration {name:?} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("{0:?} is already registered")]
    Duplicate(String),
}

/// A provider registration as seen by the resolver: name, optional qualifier, shared instance.
#[derive(Clone)]
pub struct ProviderRegistration {
    pub name: String,
    pub qualifier: Option<Qualifier>,
    pub provider: Arc<dyn EndpointProvider>,
}

impl std::fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("name", &self.name)
            .field("qualifier", &self.qualifier)
            .finish_non_exhaustive()
    }
}

/// Minimal singleton container. Every instance is registered once under a unique name;
/// iteration follows registration order.
pub struct Container {
    store: HashMap<String, Box<dyn Any + Send + Sync>>,
    order: Vec<String>,
    qualifiers: HashMap<String, Qualifier>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            order: Vec::new(),
            qualifiers: HashMap::new(),
        }
    }

    /// Register a ready-made instance under its type name.
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, value: T) -> Result<(), ContainerError> {
        self.register_singleton(std::any::type_name::<T>(), value)
    }

    /// Register an instance under an explicit name. Names are never overwritten.
    pub fn register_singleton<K, T>(&mut self, name: K, value: T) -> Result<(), ContainerError>
    where
        K: Into<String>,
        T: Send + Sync + 'static,
    {
        self.register_boxed(name, Box::new(value))
    }

    /// Register an already type-erased instance.
    pub fn register_boxed<K: Into<String>>(
        &mut self,
        name: K,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), ContainerError> {
        let name = name.into();
        if self.store.contains_key(&name) {
            return Err(ContainerError::Duplicate(name));
        }
        self.store.insert(name.clone(), value);
        self.order.push(name);
        Ok(())
    }

    /// Register an endpoint provider. `qualifier` is what a client must declare to bind to it.
    pub fn register_provider<K, P>(
        &mut self,
        name: K,
        qualifier: Option<Qualifier>,
        provider: P,
    ) -> Result<(), ContainerError>
    where
        K: Into<String>,
        P: EndpointProvider + 'static,
    {
        self.register_shared_provider(name, qualifier, Arc::new(provider))
    }

    /// Register a provider that is also held elsewhere.
    pub fn register_shared_provider<K: Into<String>>(
        &mut self,
        name: K,
        qualifier: Option<Qualifier>,
        provider: Arc<dyn EndpointProvider>,
    ) -> Result<(), ContainerError> {
        let name = name.into();
        self.register_singleton(name.clone(), provider)?;
        if let Some(qualifier) = qualifier {
            self.qualifiers.insert(name, qualifier);
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub fn get<T: 'static>(&self, name: &str) -> Result<&T, ContainerError> {
        let boxed = self
            .store
            .get(name)
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;
        boxed
            .downcast_ref::<T>()
            .ok_or_else(|| ContainerError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// First instance of type `T`, whatever its name.
    pub fn resolve<T: 'static>(&self) -> Result<&T, ContainerError> {
        self.order
            .iter()
            .find_map(|name| self.store.get(name).and_then(|b| b.downcast_ref::<T>()))
            .ok_or_else(|| ContainerError::NotFound(std::any::type_name::<T>().to_string()))
    }

    /// Names of all registrations holding a `T`, in registration order.
    pub fn names_of<T: 'static>(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.store
                    .get(name.as_str())
                    .is_some_and(|b| b.is::<T>())
            })
            .map(String::as_str)
            .collect()
    }

    /// Every registered endpoint provider with its qualifier, in registration order.
    pub fn providers(&self) -> Vec<ProviderRegistration> {
        self.names_of::<Arc<dyn EndpointProvider>>()
            .into_iter()
            .filter_map(|name| {
                let provider = self.get::<Arc<dyn EndpointProvider>>(name).ok()?;
                Some(ProviderRegistration {
                    name: name.to_string(),
                    qualifier: self.qualifiers.get(name).cloned(),
                    provider: Arc::clone(provider),
                })
            })
            .collect()
    }

    /// All registration names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("names", &self.order).finish()
    }
}
