//! restwire facade: `#[rest_client]` traits, call dispatch and start-up wiring on restwire-core.

pub mod client;
pub mod dispatch;
pub mod registry;

pub use client::{AdapterFn, BoundClient, ClientCatalog, ClientContainerExt, ClientDescriptor, RestClient};
pub use dispatch::{Call, ClientDispatcher};
pub use registry::{ClientRegistry, Clients, RegistryConfig, DEFAULT_HTTP_CLIENT_NAME};
pub use restwire_core::{
    CallError, Container, ContainerError, EndpointProvider, HttpClient, HttpRequest, HttpResponse,
    HttpTransport, HyperTransport, JsonCodec, MessageCodec, ProviderResolver, Qualifier,
    RoundRobinEndpointProvider, StaticEndpointProvider, WiringError,
};
pub use restwire_macros::rest_client;

pub use http;

#[doc(hidden)]
pub use inventory;
