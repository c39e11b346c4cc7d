//! ProviderResolver: matches a client's qualifier to one registered endpoint provider.

use std::sync::Arc;

use tracing::warn;

use crate::container::{Container, ProviderRegistration};
use crate::endpoint::EndpointProvider;
use crate::qualifier::Qualifier;
use crate::WiringError;

/// Lookup table over the provider registrations, in declaration order.
/// Built once per registration pass.
#[derive(Clone, Debug, Default)]
pub struct ProviderResolver {
    table: Vec<ProviderRegistration>,
}

impl ProviderResolver {
    pub fn new(table: Vec<ProviderRegistration>) -> Self {
        Self { table }
    }

    pub fn from_container(container: &Container) -> Self {
        Self::new(container.providers())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Provider for the client `type_name` declaring `qualifiers`. First match wins.
    pub fn resolve(
        &self,
        type_name: &str,
        qualifiers: &[Qualifier],
    ) -> Result<Arc<dyn EndpointProvider>, WiringError> {
        let Some(wanted) = Qualifier::effective(qualifiers) else {
            return self.unqualified(type_name);
        };
        for registration in &self.table {
            let Some(supplied) = &registration.qualifier else {
                continue;
            };
            if wanted.matches(supplied)? {
                return Ok(Arc::clone(&registration.provider));
            }
        }
        Err(WiringError::ProviderNotFound(format!(
            "{type_name} (requires {wanted})"
        )))
    }

    fn unqualified(&self, type_name: &str) -> Result<Arc<dyn EndpointProvider>, WiringError> {
        let first = self
            .table
            .first()
            .ok_or_else(|| WiringError::ProviderNotFound(type_name.to_string()))?;
        if self.table.len() > 1 {
            warn!(
                client = type_name,
                provider = %first.name,
                candidates = self.table.len(),
                "client declares no qualifier; binding to the first registered provider"
            );
        }
        Ok(Arc::clone(&first.provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::StaticEndpointProvider;

    fn registration(name: &str, qualifier: Option<Qualifier>) -> ProviderRegistration {
        ProviderRegistration {
            name: name.to_string(),
            qualifier,
            provider: Arc::new(StaticEndpointProvider::new(format!("http://{name}")).unwrap()),
        }
    }

    #[test]
    fn unqualified_client_takes_first_declared() {
        let resolver = ProviderResolver::new(vec![
            registration("one", Some(Qualifier::named("x"))),
            registration("two", None),
        ]);
        let provider = resolver.resolve("app::Client", &[]).unwrap();
        assert_eq!(provider.next(), "http://one");
    }

    #[test]
    fn providers_without_qualifier_are_skipped_for_qualified_clients() {
        let resolver = ProviderResolver::new(vec![
            registration("plain", None),
            registration("fast", Some(Qualifier::named("fast"))),
        ]);
        let provider = resolver
            .resolve("app::Client", &[Qualifier::generic("fast")])
            .unwrap();
        assert_eq!(provider.next(), "http://fast");
    }

    #[test]
    fn empty_table_is_provider_not_found() {
        let result = ProviderResolver::default().resolve("app::Client", &[]);
        assert!(matches!(result, Err(WiringError::ProviderNotFound(name)) if name == "app::Client"));
    }
}
