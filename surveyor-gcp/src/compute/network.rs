//! Compute VPC networks.
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use surveyor_client::{
    linker::Linker,
    wrapper::{ensure_not_cancelled, Getter, ItemStream, Lister},
};
use surveyor_core::{
    item::{attributes_from_payload, BlastPropagation, Item, DEFAULT_EXCLUDED_ATTRIBUTES},
    query::{Query, QueryMethod},
    scope::{project_scope, WILDCARD_SCOPE},
    AdapterCategory, ItemType, ItemTypeLookup, QueryError, SdkError, TerraformMapping,
};
use tokio_util::sync::CancellationToken;

use crate::types;

/// One side of a VPC peering.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkPeering {
    pub name: String,
    /// URL of the peer network, possibly in another project
    pub network: String,
    pub state: Option<String>,
}

/// A VPC network resource.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub name: String,
    pub description: Option<String>,
    pub auto_create_subnetworks: Option<bool>,
    /// URLs of the subnetworks carved out of this network
    pub subnetworks: Vec<String>,
    pub peerings: Vec<NetworkPeering>,
    pub self_link: Option<String>,
    pub mtu: Option<u32>,
}

/// Minimal SDK surface the wrapper consumes.
#[async_trait]
pub trait NetworksClient: Send + Sync + 'static {
    async fn get(&self, project_id: &str, name: &str) -> Result<Network, SdkError>;
    fn list(&self, project_id: &str) -> BoxStream<'static, Result<Network, SdkError>>;
}

/// Wrapper serving `gcp-compute-network` for one project.
///
/// Networks are global resources within a project, so the scope is the
/// project itself.
pub struct NetworkWrapper<C> {
    client: C,
    project_id: String,
    linker: Linker,
}

impl<C> NetworkWrapper<C> {
    pub fn new(client: C, project_id: impl Into<String>, linker: Linker) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            linker,
        }
    }
}

impl<C: NetworksClient> NetworkWrapper<C> {
    fn transform(&self, network: Network) -> Result<Item, QueryError> {
        let payload = serde_json::to_value(&network)
            .map_err(|err| QueryError::other(format!("cannot transform network: {err}")))?;
        let attributes = attributes_from_payload(payload, DEFAULT_EXCLUDED_ATTRIBUTES)?;
        let mut item = Item::new(
            types::compute_network().to_string(),
            "name",
            attributes,
            project_scope(&self.project_id),
        );

        let subnetwork_type = types::compute_subnetwork().to_string();
        for subnetwork in &network.subnetworks {
            self.linker
                .link(&self.project_id, &mut item, subnetwork, &subnetwork_type);
        }
        // Peer networks are same-type links; a peering that references this
        // network itself is dropped by the linker.
        let network_type = types::compute_network().to_string();
        for peering in &network.peerings {
            self.linker
                .link(&self.project_id, &mut item, &peering.network, &network_type);
        }
        // Instances using this network live in zones this wrapper cannot
        // know; the wildcard scope defers resolution to the consumer.
        if let Some(self_link) = &network.self_link {
            item.push_link(
                Query::new(
                    types::compute_instance().to_string(),
                    QueryMethod::Search,
                    self_link.clone(),
                    WILDCARD_SCOPE,
                ),
                BlastPropagation::outward(),
            );
        }
        item.validate()?;
        Ok(item)
    }
}

#[async_trait]
impl<C: NetworksClient> Getter for NetworkWrapper<C> {
    fn item_type(&self) -> ItemType {
        types::compute_network()
    }

    fn scopes(&self) -> Vec<String> {
        vec![project_scope(&self.project_id)]
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
        let network = self.client.get(&self.project_id, name).await?;
        self.transform(network)
    }

    fn potential_links(&self) -> Vec<String> {
        vec![
            types::compute_network().to_string(),
            types::compute_subnetwork().to_string(),
            types::compute_instance().to_string(),
        ]
    }

    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        vec![TerraformMapping::get("google_compute_network.name")]
    }

    fn iam_permissions(&self) -> Vec<String> {
        vec!["compute.networks.get".into(), "compute.networks.list".into()]
    }

    fn predefined_role(&self) -> Option<String> {
        Some("roles/compute.viewer".into())
    }
}

#[async_trait]
impl<C: NetworksClient> Lister for NetworkWrapper<C> {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Item>, QueryError> {
        let mut pages = self.client.list(&self.project_id);
        let mut items = Vec::new();
        while let Some(next) = pages.next().await {
            ensure_not_cancelled(cancel)?;
            items.push(self.transform(next?)?);
        }
        Ok(items)
    }

    fn list_stream(self: Arc<Self>, cancel: CancellationToken) -> ItemStream {
        Box::pin(try_stream! {
            let mut pages = self.client.list(&self.project_id);
            while let Some(next) = pages.next().await {
                ensure_not_cancelled(&cancel)?;
                yield self.transform(next?)?;
            }
        })
    }
}
