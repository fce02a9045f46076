use std::path::PathBuf;

/// Default provider config: `~/.config/vbox/provider.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("vbox")
        .join("provider.toml")
}

/// Folder VirtualBox itself uses for new VMs: `~/VirtualBox VMs`
pub fn default_base_folder() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("VirtualBox VMs")
}
