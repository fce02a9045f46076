use crate::error::ProviderError;
use crate::output::{ParsedOutput, parse_output};
use crate::runner::{CommandRunner, Invocation, run_checked};

use super::{AttachStorage, CreateMedium, Hypervisor, VirtualMachine, parent_dir};

// ── argv construction ────────────────────────────────────

pub fn createvm_args(vm: &VirtualMachine, register: bool) -> Vec<String> {
    let mut args = vec!["createvm".to_string(), "--name".into(), vm.name.clone()];
    if !vm.guest_os.is_empty() {
        args.extend(["--ostype".into(), vm.guest_os.clone()]);
    }
    if !vm.base_folder.is_empty() {
        args.extend(["--basefolder".into(), vm.base_folder.clone()]);
    }
    if register {
        args.push("--register".into());
    }
    args
}

pub fn startvm_args(name: &str) -> Vec<String> {
    vec!["startvm".into(), name.into()]
}

pub fn storagectl_args(vm_name: &str, name: &str, bus: &str, controller: &str) -> Vec<String> {
    vec![
        "storagectl".into(),
        vm_name.into(),
        "--name".into(),
        name.into(),
        "--add".into(),
        bus.into(),
        "--controller".into(),
        controller.into(),
    ]
}

pub fn storageattach_args(req: &AttachStorage) -> Vec<String> {
    vec![
        "storageattach".into(),
        req.vm_name.clone(),
        "--storagectl".into(),
        req.controller.clone(),
        "--port".into(),
        req.port.to_string(),
        "--device".into(),
        req.device.to_string(),
        "--type".into(),
        req.storage_type.clone(),
        "--medium".into(),
        req.medium.clone(),
    ]
}

pub fn createmedium_args(req: &CreateMedium) -> Vec<String> {
    vec![
        "createmedium".into(),
        req.medium_type.clone(),
        "--filename".into(),
        req.filename.clone(),
        "--size".into(),
        req.size_mb.to_string(),
        "--format".into(),
        req.format.clone(),
    ]
}

pub fn showvminfo_args(name: &str) -> Vec<String> {
    vec!["showvminfo".into(), name.into()]
}

pub fn unregistervm_args(name: &str, delete_files: bool) -> Vec<String> {
    let mut args = vec!["unregistervm".to_string(), name.into()];
    if delete_files {
        args.push("--delete".into());
    }
    args
}

/// Build a record from `showvminfo` output.
pub fn vm_from_output(parsed: &ParsedOutput) -> VirtualMachine {
    let config_file = parsed.get_or_empty("Config File").to_string();
    VirtualMachine {
        uuid: parsed.get_or_empty("UUID").to_string(),
        name: parsed.get_or_empty("Name").to_string(),
        guest_os: parsed.get_or_empty("Guest OS").to_string(),
        base_folder: parent_dir(&config_file),
        config_file,
    }
}

// ── client ───────────────────────────────────────────────

/// Drives the `VBoxManage` command-line tool, one process per operation.
pub struct VBoxManage<R> {
    executable: String,
    runner: R,
}

impl<R: CommandRunner> VBoxManage<R> {
    pub fn new(executable: impl Into<String>, runner: R) -> Self {
        Self {
            executable: executable.into(),
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn exec(&self, args: Vec<String>) -> Result<ParsedOutput, ProviderError> {
        let invocation = Invocation::new(&self.executable).args(args);
        let output = run_checked(&self.runner, &invocation).await?;
        let parsed = parse_output(&output.stdout);
        if parsed.skipped > 0 {
            tracing::debug!(
                subcommand = invocation.subcommand(),
                skipped = parsed.skipped,
                "ignored unparseable output lines"
            );
        }
        Ok(parsed)
    }
}

impl<R: CommandRunner> Hypervisor for VBoxManage<R> {
    async fn create_vm(
        &self,
        vm: &VirtualMachine,
        register: bool,
    ) -> Result<String, ProviderError> {
        let parsed = self.exec(createvm_args(vm, register)).await?;
        let uuid = parsed.get("UUID").ok_or_else(|| ProviderError::MissingField {
            command: "createvm".into(),
            field: "UUID".into(),
        })?;
        tracing::info!(name = %vm.name, uuid, "created VM");
        Ok(uuid.to_string())
    }

    async fn start_vm(&self, name: &str) -> Result<(), ProviderError> {
        self.exec(startvm_args(name)).await?;
        tracing::info!(name, "started VM");
        Ok(())
    }

    async fn add_storage_controller(
        &self,
        vm_name: &str,
        name: &str,
        bus: &str,
        controller: &str,
    ) -> Result<(), ProviderError> {
        self.exec(storagectl_args(vm_name, name, bus, controller))
            .await?;
        tracing::info!(vm = vm_name, controller = name, "added storage controller");
        Ok(())
    }

    async fn attach_storage(&self, request: &AttachStorage) -> Result<(), ProviderError> {
        self.exec(storageattach_args(request)).await?;
        tracing::info!(vm = %request.vm_name, medium = %request.medium, "attached storage");
        Ok(())
    }

    async fn create_medium(&self, request: &CreateMedium) -> Result<(), ProviderError> {
        self.exec(createmedium_args(request)).await?;
        tracing::info!(path = %request.filename, size_mb = request.size_mb, "created medium");
        Ok(())
    }

    async fn vm_info(&self, name: &str) -> Result<VirtualMachine, ProviderError> {
        let parsed = self.exec(showvminfo_args(name)).await?;
        Ok(vm_from_output(&parsed))
    }

    async fn unregister_vm(&self, name: &str, delete_files: bool) -> Result<(), ProviderError> {
        self.exec(unregistervm_args(name, delete_files)).await?;
        tracing::info!(name, delete_files, "unregistered VM");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::FakeRunner;

    const CREATEVM_OUT: &str = "\
Virtual machine 'web-01' is created and registered.
UUID: 4c2b1f1e-7f0e-4d8a-9c3b-2a1d5e6f7a8b
Settings file: '/srv/vms/web-01/web-01.vbox'
";

    const SHOWVMINFO_OUT: &str = "\
Name:                        web-01
Guest OS:                    Ubuntu (64-bit)
UUID:                        4c2b1f1e-7f0e-4d8a-9c3b-2a1d5e6f7a8b
Config file:                 /srv/vms/web-01/web-01.vbox
Config File:                 /srv/vms/web-01/web-01.vbox
State:                       powered off (since 2026-10-19T08:12:00.000000000)
";

    fn client(runner: FakeRunner) -> VBoxManage<FakeRunner> {
        VBoxManage::new("VBoxManage", runner)
    }

    fn vm(name: &str) -> VirtualMachine {
        VirtualMachine {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn createvm_minimal() {
        assert_eq!(
            createvm_args(&vm("web-01"), false),
            ["createvm", "--name", "web-01"]
        );
    }

    #[test]
    fn createvm_with_all_options() {
        let vm = VirtualMachine {
            name: "web-01".into(),
            guest_os: "Ubuntu_64".into(),
            base_folder: "/srv/vms".into(),
            ..Default::default()
        };
        assert_eq!(
            createvm_args(&vm, true),
            [
                "createvm",
                "--name",
                "web-01",
                "--ostype",
                "Ubuntu_64",
                "--basefolder",
                "/srv/vms",
                "--register"
            ]
        );
    }

    #[test]
    fn unregister_delete_flag() {
        assert_eq!(
            unregistervm_args("web-01", true),
            ["unregistervm", "web-01", "--delete"]
        );
        assert_eq!(unregistervm_args("web-01", false), ["unregistervm", "web-01"]);
    }

    #[test]
    fn storageattach_formats_numbers() {
        let req = AttachStorage {
            vm_name: "web-01".into(),
            controller: "SATA".into(),
            port: 1,
            device: 0,
            storage_type: "hdd".into(),
            medium: "/srv/vms/disk.vdi".into(),
        };
        assert_eq!(
            storageattach_args(&req),
            [
                "storageattach",
                "web-01",
                "--storagectl",
                "SATA",
                "--port",
                "1",
                "--device",
                "0",
                "--type",
                "hdd",
                "--medium",
                "/srv/vms/disk.vdi"
            ]
        );
    }

    #[test]
    fn createmedium_and_storagectl() {
        let req = CreateMedium {
            medium_type: "disk".into(),
            filename: "/srv/vms/disk.vdi".into(),
            size_mb: 20480,
            format: "VDI".into(),
        };
        assert_eq!(
            createmedium_args(&req),
            [
                "createmedium",
                "disk",
                "--filename",
                "/srv/vms/disk.vdi",
                "--size",
                "20480",
                "--format",
                "VDI"
            ]
        );
        assert_eq!(
            storagectl_args("web-01", "SATA", "sata", "IntelAhci"),
            [
                "storagectl",
                "web-01",
                "--name",
                "SATA",
                "--add",
                "sata",
                "--controller",
                "IntelAhci"
            ]
        );
    }

    #[tokio::test]
    async fn create_returns_uuid() {
        let vbox = client(FakeRunner::new().respond(0, CREATEVM_OUT, ""));
        let uuid = vbox.create_vm(&vm("web-01"), true).await.unwrap();
        assert_eq!(uuid, "4c2b1f1e-7f0e-4d8a-9c3b-2a1d5e6f7a8b");

        let calls = vbox.runner().calls.borrow();
        assert_eq!(calls[0].program, "VBoxManage");
        assert_eq!(calls[0].args, ["createvm", "--name", "web-01", "--register"]);
    }

    #[tokio::test]
    async fn create_fails_on_non_zero_exit() {
        let vbox = client(FakeRunner::new().respond(
            1,
            "",
            "VBoxManage: error: Machine settings file '/srv/vms/web-01/web-01.vbox' already exists",
        ));
        let err = vbox.create_vm(&vm("web-01"), true).await.unwrap_err();
        assert!(matches!(err, ProviderError::ExternalCommand { .. }));
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn create_fails_without_uuid() {
        let vbox = client(FakeRunner::new().respond(0, "something unexpected\n", ""));
        let err = vbox.create_vm(&vm("web-01"), false).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingField { .. }));
    }

    #[tokio::test]
    async fn vm_info_derives_folder_from_config_file() {
        let vbox = client(FakeRunner::new().respond(0, SHOWVMINFO_OUT, ""));
        let info = vbox.vm_info("web-01").await.unwrap();
        assert_eq!(
            info,
            VirtualMachine {
                uuid: "4c2b1f1e-7f0e-4d8a-9c3b-2a1d5e6f7a8b".into(),
                name: "web-01".into(),
                guest_os: "Ubuntu (64-bit)".into(),
                config_file: "/srv/vms/web-01/web-01.vbox".into(),
                base_folder: "/srv/vms/web-01".into(),
            }
        );
        assert_eq!(vbox.runner().last_args(), ["showvminfo", "web-01"]);
    }

    #[tokio::test]
    async fn vm_info_propagates_failure() {
        let vbox = client(FakeRunner::new().respond(1, "", "Could not find a registered machine"));
        assert!(vbox.vm_info("ghost").await.is_err());
    }

    #[tokio::test]
    async fn unregister_passes_delete_flag() {
        let vbox = client(FakeRunner::new());
        vbox.unregister_vm("web-01", true).await.unwrap();
        assert_eq!(
            vbox.runner().last_args(),
            ["unregistervm", "web-01", "--delete"]
        );
        vbox.unregister_vm("web-01", false).await.unwrap();
        assert_eq!(vbox.runner().last_args(), ["unregistervm", "web-01"]);
    }

    #[tokio::test]
    async fn start_fails_on_non_zero_exit() {
        let vbox = client(FakeRunner::new().respond(1, "", "VM is already running"));
        assert!(vbox.start_vm("web-01").await.is_err());
        assert_eq!(vbox.runner().last_args(), ["startvm", "web-01"]);
    }
}
