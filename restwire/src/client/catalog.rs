//! Registration table of client descriptors, scanned by root path.

use restwire_core::WiringError;

use super::ClientDescriptor;

/// Descriptors the registry may wire. `discovered()` holds every trait marked with
/// `#[rest_client]` that was linked into the binary.
#[derive(Clone, Debug, Default)]
pub struct ClientCatalog {
    descriptors: Vec<&'static ClientDescriptor>,
}

impl ClientCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discovered() -> Self {
        Self {
            descriptors: inventory::iter::<ClientDescriptor>.into_iter().collect(),
        }
    }

    pub fn with(mut self, descriptor: &'static ClientDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors at or below `root`, ordered by type name.
    pub fn scan(&self, root: &str) -> Result<Vec<&'static ClientDescriptor>, WiringError> {
        let mut found: Vec<&'static ClientDescriptor> = self
            .descriptors
            .iter()
            .copied()
            .filter(|d| d.is_under(root))
            .collect();
        found.sort_by_key(|d| d.type_name());
        if let Some(pair) = found
            .windows(2)
            .find(|pair| pair[0].type_name() == pair[1].type_name())
        {
            return Err(WiringError::ClientResolution {
                type_name: pair[0].type_name().to_string(),
                reason: "more than one adapter is registered under this name".into(),
            });
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BoundClient;
    use crate::dispatch::ClientDispatcher;
    use restwire_core::Qualifier;

    fn never_bound(_: ClientDispatcher) -> BoundClient {
        unreachable!("scan never builds adapters")
    }

    static ORDERS: ClientDescriptor = ClientDescriptor::new("shop::clients::OrdersClient", &[], never_bound);
    const FAST: &[Qualifier] = &[Qualifier::generic("fast")];

    static PRICES: ClientDescriptor =
        ClientDescriptor::new("shop::clients::pricing::PricesClient", FAST, never_bound);
    static LOOKALIKE: ClientDescriptor = ClientDescriptor::new("shop::clientside::Widget", &[], never_bound);
    static ORDERS_AGAIN: ClientDescriptor = ClientDescriptor::new("shop::clients::OrdersClient", &[], never_bound);

    #[test]
    fn scan_matches_whole_path_segments() {
        let catalog = ClientCatalog::new().with(&PRICES).with(&LOOKALIKE).with(&ORDERS);
        let names: Vec<_> = catalog
            .scan("shop::clients")
            .unwrap()
            .into_iter()
            .map(ClientDescriptor::type_name)
            .collect();
        assert_eq!(
            names,
            ["shop::clients::OrdersClient", "shop::clients::pricing::PricesClient"]
        );
        assert_eq!(catalog.scan("shop::clients::OrdersClient").unwrap().len(), 1);
        assert!(catalog.scan("shop::client").unwrap().is_empty());
        assert_eq!(catalog.scan("shop").unwrap().len(), 3);
    }

    #[test]
    fn duplicate_names_cannot_be_resolved() {
        let catalog = ClientCatalog::new().with(&ORDERS).with(&ORDERS_AGAIN);
        let err = catalog.scan("shop").unwrap_err();
        assert!(matches!(
            err,
            WiringError::ClientResolution { type_name, .. } if type_name == "shop::clients::OrdersClient"
        ));
    }

    #[test]
    fn descriptors_expose_declared_qualifiers() {
        assert_eq!(PRICES.qualifiers(), &[Qualifier::generic("fast")]);
        assert!(ORDERS.qualifiers().is_empty());
    }
}
