use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "terraform-provider-virtualbox",
    about = "VirtualBox VM provider backed by VBoxManage"
)]
pub struct Cli {
    /// Path to provider config file [default: ~/.config/vbox/provider.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for command results
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer lifecycle requests from the plugin host (JSON lines on stdin/stdout)
    Serve,

    /// Print the registered resource schemas
    Schema,

    /// Run one lifecycle callback on a virtualbox_vm resource
    Resource {
        #[command(subcommand)]
        action: ResourceCommand,
    },

    /// Call VBoxManage operations directly
    Vm {
        #[command(subcommand)]
        action: VmCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// Create the VM and print its id
    Create {
        /// VM name
        name: String,
    },
    /// Refresh state; prints an empty id if the VM is gone
    Read {
        /// Resource id (VM UUID)
        id: String,
    },
    /// Unregister the VM
    Delete {
        /// Resource id (VM UUID)
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum VmCommand {
    /// Create a VM (`createvm`)
    Create {
        /// VM name
        name: String,

        /// Guest OS type, e.g. Ubuntu_64
        #[arg(long)]
        ostype: Option<String>,

        /// Folder to create the VM in (overrides config)
        #[arg(long)]
        basefolder: Option<String>,

        /// Create without registering
        #[arg(long)]
        no_register: bool,
    },

    /// Power on a VM (`startvm`)
    Start { name: String },

    /// Add a storage controller (`storagectl`)
    Storagectl {
        vm: String,

        /// Controller name
        #[arg(long)]
        name: String,

        /// Bus type: ide, sata, scsi, floppy, sas, usb, pcie, virtio
        #[arg(long)]
        add: String,

        /// Chipset, e.g. IntelAhci, PIIX4
        #[arg(long)]
        controller: String,
    },

    /// Attach a medium to a controller port (`storageattach`)
    Storageattach {
        vm: String,

        /// Controller name
        #[arg(long)]
        storagectl: String,

        #[arg(long)]
        port: u32,

        #[arg(long)]
        device: u32,

        /// Drive type: dvddrive, hdd, fdd
        #[arg(long = "type")]
        storage_type: String,

        /// Medium path, UUID, `none` or `emptydrive`
        #[arg(long)]
        medium: String,
    },

    /// Create a disk, DVD or floppy image (`createmedium`)
    Createmedium {
        /// disk, dvd or floppy
        #[arg(default_value = "disk")]
        medium_type: String,

        #[arg(long)]
        filename: String,

        /// Size in MB
        #[arg(long)]
        size: u64,

        #[arg(long, default_value = "VDI")]
        format: String,
    },

    /// Show VM details (`showvminfo`)
    Info { name: String },

    /// Unregister a VM (`unregistervm`)
    Unregister {
        name: String,

        /// Also delete the VM's files
        #[arg(long)]
        delete: bool,
    },
}
