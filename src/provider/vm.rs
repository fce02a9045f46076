//! The `virtualbox_vm` resource.

use crate::backend::{Hypervisor, VirtualMachine};
use crate::error::ProviderError;

use super::schema::{Attribute, Presence, Schema};
use super::{Client, ResourceData};

pub const RESOURCE_TYPE: &str = "virtualbox_vm";

pub fn schema() -> Schema {
    Schema {
        attributes: vec![
            Attribute {
                name: "uuid",
                presence: Presence::Computed,
                force_new: false,
                description: "The UUID of the resource",
            },
            Attribute {
                name: "name",
                presence: Presence::Required,
                force_new: true,
                description: "The name of the resource",
            },
        ],
    }
}

pub async fn create<H: Hypervisor>(
    data: &mut ResourceData,
    client: &Client<H>,
) -> Result<(), ProviderError> {
    schema().validate_config(data)?;
    let name = data.get("name").unwrap_or_default().to_string();

    let vm = VirtualMachine {
        name,
        guest_os: client.defaults.guest_os.clone(),
        base_folder: client.defaults.base_folder.clone(),
        ..Default::default()
    };
    let uuid = client
        .hypervisor
        .create_vm(&vm, client.defaults.register)
        .await?;

    data.set_id(&uuid);
    data.set("uuid", &uuid);
    Ok(())
}

/// Refresh from the hypervisor. A VM that can't be found is reported by
/// clearing the id, not by failing.
pub async fn read<H: Hypervisor>(
    data: &mut ResourceData,
    client: &Client<H>,
) -> Result<(), ProviderError> {
    let id = data.id().to_string();
    let vm = match client.hypervisor.vm_info(&id).await {
        Ok(vm) => vm,
        // Spawn failures mean the tool is unusable, not that the VM is gone.
        Err(e @ ProviderError::Io { .. }) => return Err(e),
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "VM not found, removing from state");
            forget(data);
            return Ok(());
        }
    };

    if vm.uuid.is_empty() {
        tracing::warn!(id = %id, "showvminfo reported no UUID, removing from state");
        forget(data);
        return Ok(());
    }

    data.set_id(&vm.uuid);
    data.set("uuid", &vm.uuid);
    data.set("name", &vm.name);
    Ok(())
}

/// Drop the id and the computed `uuid`; `name` stays so the host can
/// re-create from the same attributes.
fn forget(data: &mut ResourceData) {
    data.clear_id();
    data.set("uuid", "");
}

pub async fn delete<H: Hypervisor>(
    data: &mut ResourceData,
    client: &Client<H>,
) -> Result<(), ProviderError> {
    client
        .hypervisor
        .unregister_vm(data.id(), client.defaults.delete_files)
        .await?;
    data.clear_id();
    Ok(())
}
