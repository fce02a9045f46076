//! Registration shim for the infrastructure-as-code plugin host.
//!
//! The host owns planning and state; this module only declares the
//! resource schemas and routes create/read/delete calls to the hypervisor.

pub mod schema;
pub mod vm;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use facet::Facet;

use crate::backend::{self, Hypervisor};
use crate::config::Config;
use crate::error::ProviderError;
use crate::runner::ProcessRunner;

use schema::Schema;

/// The host's handle on one resource instance: its id plus string attributes.
/// An empty id means the resource does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
#[facet(default)]
pub struct ResourceData {
    #[facet(default)]
    pub id: String,
    #[facet(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ResourceData {
    pub fn with_attribute(key: &str, value: &str) -> Self {
        let mut data = Self::default();
        data.set(key, value);
        data
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Attribute value, treating empty strings as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }
}

/// Settings applied to every VM the provider creates or destroys.
#[derive(Debug, Clone)]
pub struct VmDefaults {
    pub base_folder: String,
    pub guest_os: String,
    pub register: bool,
    pub delete_files: bool,
}

/// The configured client handed to every lifecycle callback.
pub struct Client<H> {
    pub hypervisor: H,
    pub defaults: VmDefaults,
}

/// Build the client from provider configuration.
pub fn configure(config: &Config) -> Client<backend::vboxmanage::VBoxManage<ProcessRunner>> {
    Client {
        hypervisor: backend::create_backend(config),
        defaults: VmDefaults {
            base_folder: config.base_folder().display().to_string(),
            guest_os: config.virtualbox.guest_os.clone(),
            register: config.virtualbox.register,
            delete_files: config.virtualbox.delete_files,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Create,
    Read,
    Update,
    Delete,
}

impl FromStr for LifecycleOp {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(ProviderError::Protocol {
                message: format!("unknown lifecycle operation '{other}'"),
            }),
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Every resource type this provider registers, with its schema.
pub fn resource_schemas() -> Vec<(&'static str, Schema)> {
    vec![(vm::RESOURCE_TYPE, vm::schema())]
}

pub struct Provider<H> {
    client: Client<H>,
}

impl<H: Hypervisor> Provider<H> {
    pub fn new(client: Client<H>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client<H> {
        &self.client
    }

    /// Dispatch one lifecycle callback.
    pub async fn call(
        &self,
        resource_type: &str,
        op: LifecycleOp,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        tracing::debug!(resource_type, %op, id = %data.id, "lifecycle call");
        match (resource_type, op) {
            (vm::RESOURCE_TYPE, LifecycleOp::Create) => vm::create(data, &self.client).await,
            (vm::RESOURCE_TYPE, LifecycleOp::Read) => vm::read(data, &self.client).await,
            (vm::RESOURCE_TYPE, LifecycleOp::Delete) => vm::delete(data, &self.client).await,
            (vm::RESOURCE_TYPE, op) => Err(ProviderError::UnsupportedOperation {
                resource_type: resource_type.to_string(),
                op: op.to_string(),
            }),
            _ => Err(ProviderError::UnknownResource {
                resource_type: resource_type.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::vboxmanage::VBoxManage;
    use crate::runner::fake::FakeRunner;

    fn provider(runner: FakeRunner) -> Provider<VBoxManage<FakeRunner>> {
        Provider::new(Client {
            hypervisor: VBoxManage::new("VBoxManage", runner),
            defaults: VmDefaults {
                base_folder: String::new(),
                guest_os: String::new(),
                register: false,
                delete_files: false,
            },
        })
    }

    #[test]
    fn registers_virtualbox_vm() {
        let schemas = resource_schemas();
        assert_eq!(schemas.len(), 1);
        let (name, vm_schema) = &schemas[0];
        assert_eq!(*name, "virtualbox_vm");

        let uuid = vm_schema.attribute("uuid").unwrap();
        assert_eq!(uuid.presence, schema::Presence::Computed);
        let vm_name = vm_schema.attribute("name").unwrap();
        assert_eq!(vm_name.presence, schema::Presence::Required);
        assert!(vm_name.force_new);
    }

    #[test]
    fn parses_lifecycle_ops() {
        assert_eq!("create".parse::<LifecycleOp>().unwrap(), LifecycleOp::Create);
        assert_eq!("delete".parse::<LifecycleOp>().unwrap(), LifecycleOp::Delete);
        assert!("plan".parse::<LifecycleOp>().is_err());
    }

    #[tokio::test]
    async fn update_is_not_supported() {
        let provider = provider(FakeRunner::new());
        let mut data = ResourceData::with_attribute("name", "web-01");
        let err = provider
            .call("virtualbox_vm", LifecycleOp::Update, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedOperation { .. }));
    }

    #[tokio::test]
    async fn unknown_resource_type() {
        let provider = provider(FakeRunner::new());
        let mut data = ResourceData::default();
        let err = provider
            .call("virtualbox_disk", LifecycleOp::Create, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource { .. }));
    }

    #[tokio::test]
    async fn create_without_register_omits_flag() {
        let provider = provider(FakeRunner::new().respond(0, "UUID: 1234\n", ""));
        let mut data = ResourceData::with_attribute("name", "web-01");
        provider
            .call("virtualbox_vm", LifecycleOp::Create, &mut data)
            .await
            .unwrap();
        assert_eq!(data.id(), "1234");
        assert_eq!(
            provider.client().hypervisor.runner().last_args(),
            ["createvm", "--name", "web-01"]
        );
    }

    #[test]
    fn empty_attribute_reads_as_unset() {
        let mut data = ResourceData::default();
        data.set("name", "");
        assert_eq!(data.get("name"), None);
    }
}
