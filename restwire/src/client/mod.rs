//! Client descriptors: what `#[rest_client]` emits for every client trait.

mod catalog;

pub use catalog::ClientCatalog;

use std::any::Any;
use std::sync::Arc;

use restwire_core::{Container, ContainerError, Qualifier};

use crate::dispatch::ClientDispatcher;

/// Implemented by `#[rest_client]` for `dyn Trait`; names the trait in the container.
pub trait RestClient: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
}

/// Builds the trait adapter around a dispatcher.
pub type AdapterFn = fn(ClientDispatcher) -> BoundClient;

/// One discoverable client trait: its path, declared qualifiers and adapter constructor.
#[derive(Debug)]
pub struct ClientDescriptor {
    type_name: &'static str,
    qualifiers: &'static [Qualifier],
    adapter: AdapterFn,
}

impl ClientDescriptor {
    pub const fn new(
        type_name: &'static str,
        qualifiers: &'static [Qualifier],
        adapter: AdapterFn,
    ) -> Self {
        Self {
            type_name,
            qualifiers,
            adapter,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifiers(&self) -> &'static [Qualifier] {
        self.qualifiers
    }

    /// Whether the client lives at `root` or in a module below it.
    pub fn is_under(&self, root: &str) -> bool {
        match self.type_name.strip_prefix(root) {
            Some("") => true,
            Some(rest) => rest.starts_with("::"),
            None => false,
        }
    }

    pub fn bind(&self, dispatcher: ClientDispatcher) -> BoundClient {
        (self.adapter)(dispatcher)
    }
}

inventory::collect!(ClientDescriptor);

/// A constructed client adapter, type-erased as `Arc<dyn Trait>`, ready to publish.
pub struct BoundClient {
    type_name: &'static str,
    instance: Box<dyn Any + Send + Sync>,
}

impl BoundClient {
    pub fn new<T: RestClient + ?Sized>(client: Arc<T>) -> Self {
        Self {
            type_name: T::TYPE_NAME,
            instance: Box::new(client),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn publish(self, container: &mut Container) -> Result<(), ContainerError> {
        container.register_boxed(self.type_name, self.instance)
    }
}

impl std::fmt::Debug for BoundClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundClient")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Client registration and lookup by trait.
pub trait ClientContainerExt {
    /// Register a hand-written implementation; the registry will not wire over it.
    fn register_client<T: RestClient + ?Sized>(&mut self, client: Arc<T>) -> Result<(), ContainerError>;

    fn client<T: RestClient + ?Sized>(&self) -> Result<Arc<T>, ContainerError>;
}

impl ClientContainerExt for Container {
    fn register_client<T: RestClient + ?Sized>(&mut self, client: Arc<T>) -> Result<(), ContainerError> {
        self.register_singleton(T::TYPE_NAME, client)
    }

    fn client<T: RestClient + ?Sized>(&self) -> Result<Arc<T>, ContainerError> {
        self.get::<Arc<T>>(T::TYPE_NAME).map(Arc::clone)
    }
}
