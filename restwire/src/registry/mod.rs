//! ClientRegistry: discovers client traits at start-up, binds each to its endpoint
//! provider and publishes the adapters into the container.

mod config;

pub use config::RegistryConfig;

use std::sync::Arc;

use restwire_core::{Container, ContainerError, HttpClient, ProviderResolver, WiringError};
use tracing::{debug, info};

use crate::client::{ClientCatalog, ClientContainerExt, ClientDescriptor, RestClient};
use crate::dispatch::ClientDispatcher;

/// Container name of the HTTP client installed when none was registered.
pub const DEFAULT_HTTP_CLIENT_NAME: &str = "restwire.http_client";

#[derive(Clone, Debug)]
pub struct ClientRegistry {
    base_packages: Vec<String>,
    catalog: Option<ClientCatalog>,
}

impl ClientRegistry {
    /// Fails with `Configuration` when no root is given or a root is blank.
    pub fn new<I, S>(base_packages: I) -> Result<Self, WiringError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roots = Vec::new();
        for package in base_packages {
            let package: String = package.into();
            let root = package.trim().trim_end_matches("::");
            if root.is_empty() {
                return Err(WiringError::Configuration(format!(
                    "blank base package {package:?}"
                )));
            }
            roots.push(root.to_string());
        }
        if roots.is_empty() {
            return Err(WiringError::Configuration(
                "client registry needs at least one base package".into(),
            ));
        }
        Ok(Self {
            base_packages: roots,
            catalog: None,
        })
    }

    pub fn from_config(config: RegistryConfig) -> Result<Self, WiringError> {
        Self::new(config.base_packages)
    }

    /// Scan `catalog` instead of the descriptors linked into the binary.
    pub fn with_catalog(mut self, catalog: ClientCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    /// Wire every client found under the base packages. The first failure aborts the pass
    /// and the container is dropped with it.
    pub fn register(self, mut container: Container) -> Result<Clients, WiringError> {
        let http = provide_http_client(&mut container)?;
        let resolver = ProviderResolver::from_container(&container);
        let catalog = self.catalog.unwrap_or_else(ClientCatalog::discovered);

        for root in &self.base_packages {
            for descriptor in catalog.scan(root)? {
                wire(descriptor, &resolver, &http, &mut container)?;
            }
        }
        Ok(Clients {
            container: Arc::new(container),
        })
    }
}

fn provide_http_client(container: &mut Container) -> Result<HttpClient, WiringError> {
    if let Ok(http) = container.resolve::<HttpClient>() {
        return Ok(http.clone());
    }
    let http = HttpClient::default_json()?;
    container.register_singleton(DEFAULT_HTTP_CLIENT_NAME, http.clone())?;
    info!(name = DEFAULT_HTTP_CLIENT_NAME, "installed default HTTP client");
    Ok(http)
}

fn wire(
    descriptor: &ClientDescriptor,
    resolver: &ProviderResolver,
    http: &HttpClient,
    container: &mut Container,
) -> Result<(), WiringError> {
    let type_name = descriptor.type_name();
    // Overlapping roots see the same client twice; so does an explicit registration.
    if container.contains(type_name) {
        debug!(client = type_name, "already registered, skipping");
        return Ok(());
    }
    let provider = resolver.resolve(type_name, descriptor.qualifiers())?;
    let dispatcher = ClientDispatcher::new(type_name, provider, http.clone());
    descriptor.bind(dispatcher).publish(container)?;
    info!(
        client = type_name,
        qualifiers = descriptor.qualifiers().len(),
        "client wired"
    );
    Ok(())
}

/// The container after registration: read-only and cheap to share.
#[derive(Clone, Debug)]
pub struct Clients {
    container: Arc<Container>,
}

impl Clients {
    pub fn get<T: RestClient + ?Sized>(&self) -> Result<Arc<T>, ContainerError> {
        self.container.client::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.container.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.container.names()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}
