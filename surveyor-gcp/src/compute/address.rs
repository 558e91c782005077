//! Compute addresses: reserved internal and external IPs.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use surveyor_client::{
    linker::{Linker, IP_TYPE},
    wrapper::{ensure_not_cancelled, Getter, ItemStream, Lister},
};
use surveyor_core::{
    item::{attributes_from_payload, Health, Item, DEFAULT_EXCLUDED_ATTRIBUTES},
    scope::regional_scope,
    AdapterCategory, ItemType, ItemTypeLookup, QueryError, SdkError, TerraformMapping,
};
use tokio_util::sync::CancellationToken;

use crate::types;

/// A compute address resource, as the API returns it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub name: String,
    pub address: String,
    pub address_type: Option<String>,
    pub purpose: Option<String>,
    pub status: Option<String>,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    pub users: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub self_link: Option<String>,
    pub description: Option<String>,
}

/// Minimal SDK surface the wrapper consumes; concrete clients live outside
/// this crate.
#[async_trait]
pub trait AddressesClient: Send + Sync + 'static {
    /// Fetch one address by name.
    async fn get(&self, project_id: &str, region: &str, name: &str) -> Result<Address, SdkError>;

    /// Iterate every address in the region.
    fn list(&self, project_id: &str, region: &str) -> BoxStream<'static, Result<Address, SdkError>>;
}

/// Wrapper serving `gcp-compute-address` in one region.
pub struct AddressWrapper<C> {
    client: C,
    project_id: String,
    region: String,
    linker: Linker,
}

impl<C> AddressWrapper<C> {
    /// Bind a client to a project and region.
    pub fn new(
        client: C,
        project_id: impl Into<String>,
        region: impl Into<String>,
        linker: Linker,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            region: region.into(),
            linker,
        }
    }
}

fn address_health(status: Option<&str>) -> Option<Health> {
    status.map(|status| match status {
        "RESERVED" | "IN_USE" => Health::Ok,
        "RESERVING" => Health::Pending,
        _ => Health::Unknown,
    })
}

impl<C: AddressesClient> AddressWrapper<C> {
    fn transform(&self, address: Address) -> Result<Item, QueryError> {
        let payload = serde_json::to_value(&address)
            .map_err(|err| QueryError::other(format!("cannot transform address: {err}")))?;
        let attributes = attributes_from_payload(payload, DEFAULT_EXCLUDED_ATTRIBUTES)?;
        let mut item = Item::new(
            types::compute_address().to_string(),
            "name",
            attributes,
            regional_scope(&self.project_id, &self.region),
        );
        item.health = address_health(address.status.as_deref());
        item.tags = address.labels;

        if let Some(network) = &address.network {
            self.linker.link(
                &self.project_id,
                &mut item,
                network,
                &types::compute_network().to_string(),
            );
        }
        if let Some(subnetwork) = &address.subnetwork {
            self.linker.link(
                &self.project_id,
                &mut item,
                subnetwork,
                &types::compute_subnetwork().to_string(),
            );
        }
        if !address.address.is_empty() {
            self.linker
                .link(&self.project_id, &mut item, &address.address, IP_TYPE);
        }
        item.validate()?;
        Ok(item)
    }
}

#[async_trait]
impl<C: AddressesClient> Getter for AddressWrapper<C> {
    fn item_type(&self) -> ItemType {
        types::compute_address()
    }

    fn scopes(&self) -> Vec<String> {
        vec![regional_scope(&self.project_id, &self.region)]
    }

    fn category(&self) -> AdapterCategory {
        AdapterCategory::Network
    }

    fn get_lookups(&self) -> Vec<ItemTypeLookup> {
        vec![ItemTypeLookup::new("name", self.item_type())]
    }

    async fn get(
        &self,
        cancel: &CancellationToken,
        query_parts: &[String],
    ) -> Result<Item, QueryError> {
        ensure_not_cancelled(cancel)?;
        let [name] = query_parts else {
            return Err(QueryError::other("expected exactly one query part"));
        };
        let address = self.client.get(&self.project_id, &self.region, name).await?;
        self.transform(address)
    }

    fn potential_links(&self) -> Vec<String> {
        vec![
            types::compute_network().to_string(),
            types::compute_subnetwork().to_string(),
            IP_TYPE.to_string(),
        ]
    }

    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        vec![TerraformMapping::get("google_compute_address.name")]
    }

    fn iam_permissions(&self) -> Vec<String> {
        vec!["compute.addresses.get".into(), "compute.addresses.list".into()]
    }

    fn predefined_role(&self) -> Option<String> {
        Some("roles/compute.viewer".into())
    }
}

#[async_trait]
impl<C: AddressesClient> Lister for AddressWrapper<C> {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Item>, QueryError> {
        let mut pages = self.client.list(&self.project_id, &self.region);
        let mut items = Vec::new();
        while let Some(next) = pages.next().await {
            ensure_not_cancelled(cancel)?;
            items.push(self.transform(next?)?);
        }
        Ok(items)
    }

    fn list_stream(self: Arc<Self>, cancel: CancellationToken) -> ItemStream {
        Box::pin(try_stream! {
            let mut pages = self.client.list(&self.project_id, &self.region);
            while let Some(next) = pages.next().await {
                ensure_not_cancelled(&cancel)?;
                yield self.transform(next?)?;
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use futures::stream;
    use surveyor_core::item::BlastPropagation;

    use super::*;
    use crate::links::link_registry;

    struct FakeAddresses {
        addresses: Vec<Address>,
    }

    #[async_trait]
    impl AddressesClient for FakeAddresses {
        async fn get(
            &self,
            _project_id: &str,
            _region: &str,
            name: &str,
        ) -> Result<Address, SdkError> {
            self.addresses
                .iter()
                .find(|a| a.name == name)
                .cloned()
                .ok_or_else(|| SdkError::NotFound(format!("address {name:?} was not found")))
        }

        fn list(
            &self,
            _project_id: &str,
            _region: &str,
        ) -> BoxStream<'static, Result<Address, SdkError>> {
            Box::pin(stream::iter(
                self.addresses.clone().into_iter().map(Ok).collect::<Vec<_>>(),
            ))
        }
    }

    fn reserved_address() -> Address {
        Address {
            name: "addr1".into(),
            address: "10.0.0.5".into(),
            status: Some("RESERVED".into()),
            network: Some("global/networks/net1".into()),
            subnetwork: Some("regions/us-central1/subnetworks/sub1".into()),
            labels: [("env".to_string(), "prod".to_string())].into(),
            ..Default::default()
        }
    }

    fn wrapper() -> AddressWrapper<FakeAddresses> {
        AddressWrapper::new(
            FakeAddresses {
                addresses: vec![reserved_address()],
            },
            "proj",
            "us-central1",
            Linker::new(Arc::new(link_registry())),
        )
    }

    #[tokio::test]
    async fn get_transforms_and_links() {
        let wrapper = wrapper();
        let cancel = CancellationToken::new();
        let item = wrapper
            .get(&cancel, &["addr1".to_string()])
            .await
            .expect("address resolves");

        assert_eq!(item.item_type, "gcp-compute-address");
        assert_eq!(item.unique_attribute, "name");
        assert_eq!(item.unique_attribute_value(), Some("addr1"));
        assert_eq!(item.scope, "proj.us-central1");
        assert_eq!(item.health, Some(Health::Ok));
        assert_eq!(item.tags.get("env").map(String::as_str), Some("prod"));
        assert!(item.attributes.get("labels").is_none());

        let links: Vec<(&str, &str, &str)> = item
            .linked_item_queries
            .iter()
            .map(|l| {
                (
                    l.query.item_type.as_str(),
                    l.query.query.as_str(),
                    l.query.scope.as_str(),
                )
            })
            .collect();
        assert_eq!(
            links,
            vec![
                ("gcp-compute-network", "net1", "proj"),
                ("gcp-compute-subnetwork", "sub1", "proj.us-central1"),
                ("ip", "10.0.0.5", "global"),
            ]
        );
        assert_eq!(
            item.linked_item_queries[2].blast_propagation,
            BlastPropagation::both()
        );
    }

    #[tokio::test]
    async fn get_missing_maps_sdk_notfound() {
        let wrapper = wrapper();
        let cancel = CancellationToken::new();
        let err = wrapper
            .get(&cancel, &["addr9".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind, surveyor_core::QueryErrorKind::NotFound);
        assert!(err.message.contains("addr9"));
    }

    #[tokio::test]
    async fn list_streams_every_address() {
        use futures::TryStreamExt;
        let wrapper = Arc::new(wrapper());
        let items: Vec<Item> = wrapper
            .list_stream(CancellationToken::new())
            .try_collect()
            .await
            .expect("stream completes");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn health_mapping() {
        assert_eq!(address_health(Some("RESERVED")), Some(Health::Ok));
        assert_eq!(address_health(Some("IN_USE")), Some(Health::Ok));
        assert_eq!(address_health(Some("RESERVING")), Some(Health::Pending));
        assert_eq!(address_health(Some("SOMETHING")), Some(Health::Unknown));
        assert_eq!(address_health(None), None);
    }
}
