pub mod vboxmanage;

use std::path::Path;

use facet::Facet;

use crate::config::Config;
use crate::error::ProviderError;
use crate::runner::ProcessRunner;

/// A virtual machine as reported by the hypervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
pub struct VirtualMachine {
    pub uuid: String,
    pub name: String,
    pub guest_os: String,
    pub config_file: String,
    pub base_folder: String,
}

/// Parent directory of `path`, `.` when it has none. A trailing slash is
/// ignored, so `/a/b/` yields `/a`.
pub fn parent_dir(path: &str) -> String {
    match Path::new(path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.display().to_string(),
        None if path.starts_with('/') => "/".into(),
        _ => ".".into(),
    }
}

/// The operations the provider needs from a hypervisor.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Hypervisor {
    /// Create a VM, returning its UUID.
    async fn create_vm(
        &self,
        vm: &VirtualMachine,
        register: bool,
    ) -> Result<String, ProviderError>;
    async fn start_vm(&self, name: &str) -> Result<(), ProviderError>;
    async fn add_storage_controller(
        &self,
        vm_name: &str,
        name: &str,
        bus: &str,
        controller: &str,
    ) -> Result<(), ProviderError>;
    async fn attach_storage(&self, request: &AttachStorage) -> Result<(), ProviderError>;
    async fn create_medium(&self, request: &CreateMedium) -> Result<(), ProviderError>;
    async fn vm_info(&self, name: &str) -> Result<VirtualMachine, ProviderError>;
    async fn unregister_vm(&self, name: &str, delete_files: bool) -> Result<(), ProviderError>;
}

/// Arguments for `storageattach`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachStorage {
    pub vm_name: String,
    pub controller: String,
    pub port: u32,
    pub device: u32,
    pub storage_type: String,
    pub medium: String,
}

/// Arguments for `createmedium`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMedium {
    pub medium_type: String,
    pub filename: String,
    /// Size in MB.
    pub size_mb: u64,
    pub format: String,
}

pub fn create_backend(config: &Config) -> vboxmanage::VBoxManage<ProcessRunner> {
    vboxmanage::VBoxManage::new(config.virtualbox.executable.clone(), ProcessRunner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_of_config_file() {
        assert_eq!(parent_dir("/srv/vms/web-01/web-01.vbox"), "/srv/vms/web-01");
    }

    #[test]
    fn parent_dir_edge_cases() {
        assert_eq!(parent_dir("web-01.vbox"), ".");
        assert_eq!(parent_dir(""), ".");
        assert_eq!(parent_dir("/"), "/");
    }

    #[test]
    fn parent_dir_ignores_trailing_slash() {
        assert_eq!(parent_dir("/srv/vms/web-01/"), "/srv/vms");
    }
}
