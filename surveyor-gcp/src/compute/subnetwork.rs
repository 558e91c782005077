//! Compute subnetworks.
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
    item::{attributes_from_payload, Item, DEFAULT_EXCLUDED_ATTRIBUTES},
    scope::regional_scope,
    AdapterCategory, ItemType, ItemTypeLookup, QueryError, SdkError, TerraformMapping,
};
use tokio_util::sync::CancellationToken;

use crate::types;

/// A subnetwork resource.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnetwork {
    pub name: String,
    pub network: Option<String>,
    pub ip_cidr_range: Option<String>,
    pub gateway_address: Option<String>,
    pub purpose: Option<String>,
    pub stack_type: Option<String>,
    pub private_ip_google_access: Option<bool>,
    pub self_link: Option<String>,
}

/// Minimal SDK surface the wrapper consumes.
#[async_trait]
pub trait SubnetworksClient: Send + Sync + 'static {
    async fn get(&self, project_id: &str, region: &str, name: &str)
        -> Result<Subnetwork, SdkError>;
    fn list(
        &self,
        project_id: &str,
        region: &str,
    ) -> BoxStream<'static, Result<Subnetwork, SdkError>>;
}

/// Wrapper serving `gcp-compute-subnetwork` in one region.
pub struct SubnetworkWrapper<C> {
    client: C,
    project_id: String,
    region: String,
    linker: Linker,
}

impl<C> SubnetworkWrapper<C> {
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

impl<C: SubnetworksClient> SubnetworkWrapper<C> {
    fn transform(&self, subnetwork: Subnetwork) -> Result<Item, QueryError> {
        let payload = serde_json::to_value(&subnetwork)
            .map_err(|err| QueryError::other(format!("cannot transform subnetwork: {err}")))?;
        let attributes = attributes_from_payload(payload, DEFAULT_EXCLUDED_ATTRIBUTES)?;
        let mut item = Item::new(
            types::compute_subnetwork().to_string(),
            "name",
            attributes,
            regional_scope(&self.project_id, &self.region),
        );

        if let Some(network) = &subnetwork.network {
            self.linker.link(
                &self.project_id,
                &mut item,
                network,
                &types::compute_network().to_string(),
            );
        }
        if let Some(gateway) = &subnetwork.gateway_address {
            self.linker.link(&self.project_id, &mut item, gateway, IP_TYPE);
        }
        item.validate()?;
        Ok(item)
    }
}

#[async_trait]
impl<C: SubnetworksClient> Getter for SubnetworkWrapper<C> {
    fn item_type(&self) -> ItemType {
        types::compute_subnetwork()
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
        let subnetwork = self.client.get(&self.project_id, &self.region, name).await?;
        self.transform(subnetwork)
    }

    fn potential_links(&self) -> Vec<String> {
        vec![types::compute_network().to_string(), IP_TYPE.to_string()]
    }

    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        vec![TerraformMapping::get("google_compute_subnetwork.name")]
    }

    fn iam_permissions(&self) -> Vec<String> {
        vec![
            "compute.subnetworks.get".into(),
            "compute.subnetworks.list".into(),
        ]
    }

    fn predefined_role(&self) -> Option<String> {
        Some("roles/compute.viewer".into())
    }
}

#[async_trait]
impl<C: SubnetworksClient> Lister for SubnetworkWrapper<C> {
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
