//! Compute instances.
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
    scope::zonal_scope,
    AdapterCategory, ItemType, ItemTypeLookup, QueryError, SdkError, TerraformMapping,
};
use tokio_util::sync::CancellationToken;

use crate::types;

/// An external access config on an interface.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessConfig {
    pub name: Option<String>,
    pub nat_ip: Option<String>,
    #[serde(rename = "type")]
    pub config_type: Option<String>,
}

/// One NIC of an instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    pub name: Option<String>,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    #[serde(rename = "networkIP")]
    pub network_ip: Option<String>,
    pub access_configs: Vec<AccessConfig>,
}

/// A disk attached to an instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachedDisk {
    pub device_name: Option<String>,
    pub source: Option<String>,
    pub boot: Option<bool>,
}

/// A compute instance resource.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub name: String,
    pub status: Option<String>,
    pub machine_type: Option<String>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub disks: Vec<AttachedDisk>,
    pub labels: BTreeMap<String, String>,
    pub self_link: Option<String>,
    pub zone: Option<String>,
}

/// Minimal SDK surface the wrapper consumes.
#[async_trait]
pub trait InstancesClient: Send + Sync + 'static {
    async fn get(&self, project_id: &str, zone: &str, name: &str) -> Result<Instance, SdkError>;
    fn list(&self, project_id: &str, zone: &str) -> BoxStream<'static, Result<Instance, SdkError>>;
}

/// Wrapper serving `gcp-compute-instance` in one zone.
pub struct InstanceWrapper<C> {
    client: C,
    project_id: String,
    zone: String,
    linker: Linker,
}

impl<C> InstanceWrapper<C> {
    pub fn new(
        client: C,
        project_id: impl Into<String>,
        zone: impl Into<String>,
        linker: Linker,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            zone: zone.into(),
            linker,
        }
    }
}

fn instance_health(status: Option<&str>) -> Option<Health> {
    status.map(|status| match status {
        "RUNNING" => Health::Ok,
        "PROVISIONING" | "STAGING" | "STOPPING" | "SUSPENDING" | "REPAIRING" => Health::Pending,
        "TERMINATED" | "SUSPENDED" => Health::Error,
        _ => Health::Unknown,
    })
}

impl<C: InstancesClient> InstanceWrapper<C> {
    fn transform(&self, instance: Instance) -> Result<Item, QueryError> {
        let payload = serde_json::to_value(&instance)
            .map_err(|err| QueryError::other(format!("cannot transform instance: {err}")))?;
        let attributes = attributes_from_payload(payload, DEFAULT_EXCLUDED_ATTRIBUTES)?;
        let mut item = Item::new(
            types::compute_instance().to_string(),
            "name",
            attributes,
            zonal_scope(&self.project_id, &self.zone),
        );
        item.health = instance_health(instance.status.as_deref());
        item.tags = instance.labels;

        let network_type = types::compute_network().to_string();
        let subnetwork_type = types::compute_subnetwork().to_string();
        for interface in &instance.network_interfaces {
            if let Some(network) = &interface.network {
                self.linker
                    .link(&self.project_id, &mut item, network, &network_type);
            }
            if let Some(subnetwork) = &interface.subnetwork {
                self.linker
                    .link(&self.project_id, &mut item, subnetwork, &subnetwork_type);
            }
            if let Some(ip) = &interface.network_ip {
                self.linker.link(&self.project_id, &mut item, ip, IP_TYPE);
            }
            for config in &interface.access_configs {
                if let Some(nat_ip) = &config.nat_ip {
                    self.linker.link(&self.project_id, &mut item, nat_ip, IP_TYPE);
                }
            }
        }
        let disk_type = types::compute_disk().to_string();
        for disk in &instance.disks {
            if let Some(source) = &disk.source {
                self.linker.link(&self.project_id, &mut item, source, &disk_type);
            }
        }
        item.validate()?;
        Ok(item)
    }
}

#[async_trait]
impl<C: InstancesClient> Getter for InstanceWrapper<C> {
    fn item_type(&self) -> ItemType {
        types::compute_instance()
    }

    fn scopes(&self) -> Vec<String> {
        vec![zonal_scope(&self.project_id, &self.zone)]
    }

    fn category(&self) -> AdapterCategory {
        AdapterCategory::Compute
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
        let instance = self.client.get(&self.project_id, &self.zone, name).await?;
        self.transform(instance)
    }

    fn potential_links(&self) -> Vec<String> {
        vec![
            types::compute_network().to_string(),
            types::compute_subnetwork().to_string(),
            types::compute_disk().to_string(),
            IP_TYPE.to_string(),
        ]
    }

    fn terraform_mappings(&self) -> Vec<TerraformMapping> {
        vec![TerraformMapping::get("google_compute_instance.name")]
    }

    fn iam_permissions(&self) -> Vec<String> {
        vec!["compute.instances.get".into(), "compute.instances.list".into()]
    }

    fn predefined_role(&self) -> Option<String> {
        Some("roles/compute.viewer".into())
    }
}

#[async_trait]
impl<C: InstancesClient> Lister for InstanceWrapper<C> {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Item>, QueryError> {
        let mut pages = self.client.list(&self.project_id, &self.zone);
        let mut items = Vec::new();
        while let Some(next) = pages.next().await {
            ensure_not_cancelled(cancel)?;
            items.push(self.transform(next?)?);
        }
        Ok(items)
    }

    fn list_stream(self: Arc<Self>, cancel: CancellationToken) -> ItemStream {
        Box::pin(try_stream! {
            let mut pages = self.client.list(&self.project_id, &self.zone);
            while let Some(next) = pages.next().await {
                ensure_not_cancelled(&cancel)?;
                yield self.transform(next?)?;
            }
        })
    }
}

#[cfg(test)]
mod test {
    use futures::stream;

    use super::*;
    use crate::links::link_registry;

    struct FakeInstances {
        instances: Vec<Instance>,
    }

    #[async_trait]
    impl InstancesClient for FakeInstances {
        async fn get(
            &self,
            _project_id: &str,
            _zone: &str,
            name: &str,
        ) -> Result<Instance, SdkError> {
            self.instances
                .iter()
                .find(|i| i.name == name)
                .cloned()
                .ok_or_else(|| SdkError::NotFound(format!("instance {name:?} was not found")))
        }

        fn list(
            &self,
            _project_id: &str,
            _zone: &str,
        ) -> BoxStream<'static, Result<Instance, SdkError>> {
            Box::pin(stream::iter(
                self.instances
                    .clone()
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<_>>(),
            ))
        }
    }

    fn running_instance() -> Instance {
        Instance {
            name: "vm1".into(),
            status: Some("RUNNING".into()),
            network_interfaces: vec![NetworkInterface {
                network: Some("projects/proj/global/networks/net1".into()),
                subnetwork: Some("projects/proj/regions/us-central1/subnetworks/sub1".into()),
                network_ip: Some("10.0.0.7".into()),
                access_configs: vec![AccessConfig {
                    nat_ip: Some("203.0.113.9".into()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            disks: vec![AttachedDisk {
                source: Some("projects/proj/zones/us-central1-a/disks/boot".into()),
                boot: Some(true),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn links_every_interface_reference() {
        let wrapper = InstanceWrapper::new(
            FakeInstances {
                instances: vec![running_instance()],
            },
            "proj",
            "us-central1-a",
            Linker::new(Arc::new(link_registry())),
        );
        let item = wrapper
            .get(&CancellationToken::new(), &["vm1".to_string()])
            .await
            .expect("instance resolves");
        assert_eq!(item.scope, "proj.us-central1-a");
        assert_eq!(item.health, Some(Health::Ok));
        let links: Vec<(&str, &str)> = item
            .linked_item_queries
            .iter()
            .map(|l| (l.query.item_type.as_str(), l.query.query.as_str()))
            .collect();
        assert_eq!(
            links,
            vec![
                ("gcp-compute-network", "net1"),
                ("gcp-compute-subnetwork", "sub1"),
                ("ip", "10.0.0.7"),
                ("ip", "203.0.113.9"),
                ("gcp-compute-disk", "boot"),
            ]
        );
        // the disk link is scoped to the zone from its path
        assert_eq!(
            item.linked_item_queries.last().unwrap().query.scope,
            "proj.us-central1-a"
        );
    }

    #[test]
    fn health_mapping() {
        assert_eq!(instance_health(Some("RUNNING")), Some(Health::Ok));
        assert_eq!(instance_health(Some("STAGING")), Some(Health::Pending));
        assert_eq!(instance_health(Some("TERMINATED")), Some(Health::Error));
        assert_eq!(instance_health(Some("NEW_STATE")), Some(Health::Unknown));
    }
}
