//! Compute adapters: handcrafted wrappers over typed SDK surfaces, plus a
//! dynamic meta for disks.

pub mod address;
pub mod disk;
pub mod instance;
pub mod network;
pub mod subnetwork;

pub use address::{Address, AddressWrapper, AddressesClient};
pub use instance::{Instance, InstanceWrapper, InstancesClient};
pub use network::{Network, NetworkWrapper, NetworksClient};
pub use subnetwork::{Subnetwork, SubnetworkWrapper, SubnetworksClient};
