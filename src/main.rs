use clap::Parser;
use facet::Facet;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vbox::backend::{AttachStorage, CreateMedium, Hypervisor, VirtualMachine};
use vbox::cli::{Cli, Command, OutputFormat, ResourceCommand, VmCommand};
use vbox::config;
use vbox::error::ProviderError;
use vbox::logging;
use vbox::provider::{self, LifecycleOp, Provider, ResourceData};

#[derive(Facet)]
struct UuidJson {
    uuid: String,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // stdout carries command results and the serve protocol; logs go to stderr.
    let terminal_filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vbox=info"))
    };
    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(terminal_filter);

    let (file_writer, file_handle) = logging::DeferredFileWriter::new();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("vbox=debug"));

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();

    if matches!(cli.command, Command::Schema) {
        return print_schemas(cli.output).map_err(Into::into);
    }

    let config = config::load_config(cli.config.as_deref())?;
    if let Some(path) = config.log_file() {
        file_handle.set_file(path).map_err(|e| ProviderError::Io {
            context: format!("opening log file {}", path.display()),
            source: e,
        })?;
    }

    let provider = Provider::new(provider::configure(&config));

    match cli.command {
        Command::Schema => unreachable!(),
        Command::Serve => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            vbox::serve::serve(&provider, stdin, tokio::io::stdout()).await?;
        }
        Command::Resource { action } => {
            let (op, mut data) = match action {
                ResourceCommand::Create { name } => {
                    (LifecycleOp::Create, ResourceData::with_attribute("name", &name))
                }
                ResourceCommand::Read { id } => (LifecycleOp::Read, resource_with_id(&id)),
                ResourceCommand::Delete { id } => (LifecycleOp::Delete, resource_with_id(&id)),
            };
            provider
                .call(provider::vm::RESOURCE_TYPE, op, &mut data)
                .await?;
            print_resource(&data, cli.output)?;
        }
        Command::Vm { action } => {
            run_vm_command(&provider, &config, action, cli.output).await?;
        }
    }

    Ok(())
}

fn resource_with_id(id: &str) -> ResourceData {
    let mut data = ResourceData::default();
    data.set_id(id);
    data
}

async fn run_vm_command<H: Hypervisor>(
    provider: &Provider<H>,
    config: &config::Config,
    action: VmCommand,
    output: OutputFormat,
) -> Result<(), ProviderError> {
    let vbox = &provider.client().hypervisor;
    match action {
        VmCommand::Create {
            name,
            ostype,
            basefolder,
            no_register,
        } => {
            let vm = VirtualMachine {
                name,
                guest_os: ostype.unwrap_or_else(|| config.virtualbox.guest_os.clone()),
                base_folder: basefolder
                    .unwrap_or_else(|| config.base_folder().display().to_string()),
                ..Default::default()
            };
            let uuid = vbox.create_vm(&vm, !no_register).await?;
            match output {
                OutputFormat::Json => println!("{}", to_json(&UuidJson { uuid })?),
                OutputFormat::Plain => println!("{uuid}"),
            }
        }
        VmCommand::Start { name } => vbox.start_vm(&name).await?,
        VmCommand::Storagectl {
            vm,
            name,
            add,
            controller,
        } => {
            vbox.add_storage_controller(&vm, &name, &add, &controller)
                .await?
        }
        VmCommand::Storageattach {
            vm,
            storagectl,
            port,
            device,
            storage_type,
            medium,
        } => {
            vbox.attach_storage(&AttachStorage {
                vm_name: vm,
                controller: storagectl,
                port,
                device,
                storage_type,
                medium,
            })
            .await?
        }
        VmCommand::Createmedium {
            medium_type,
            filename,
            size,
            format,
        } => {
            vbox.create_medium(&CreateMedium {
                medium_type,
                filename,
                size_mb: size,
                format,
            })
            .await?
        }
        VmCommand::Info { name } => {
            let vm = vbox.vm_info(&name).await?;
            match output {
                OutputFormat::Json => println!("{}", to_json(&vm)?),
                OutputFormat::Plain => {
                    println!("UUID:        {}", vm.uuid);
                    println!("Name:        {}", vm.name);
                    println!("Guest OS:    {}", vm.guest_os);
                    println!("Config File: {}", vm.config_file);
                    println!("Folder:      {}", vm.base_folder);
                }
            }
        }
        VmCommand::Unregister { name, delete } => vbox.unregister_vm(&name, delete).await?,
    }
    Ok(())
}

fn print_resource(data: &ResourceData, output: OutputFormat) -> Result<(), ProviderError> {
    match output {
        OutputFormat::Json => println!("{}", to_json(data)?),
        OutputFormat::Plain => {
            println!("id: {}", data.id);
            for (key, value) in &data.attributes {
                println!("{key}: {value}");
            }
        }
    }
    Ok(())
}

fn print_schemas(output: OutputFormat) -> Result<(), ProviderError> {
    for (resource_type, schema) in provider::resource_schemas() {
        match output {
            OutputFormat::Json => println!("{}", to_json(&schema.describe(resource_type))?),
            OutputFormat::Plain => {
                println!("{resource_type}");
                for attr in &schema.attributes {
                    let force_new = if attr.force_new { ", force new" } else { "" };
                    println!(
                        "  {} ({}{force_new}): {}",
                        attr.name,
                        attr.presence.as_str(),
                        attr.description
                    );
                }
            }
        }
    }
    Ok(())
}

fn to_json<'a, T: Facet<'a>>(value: &T) -> Result<String, ProviderError> {
    facet_json::to_string(value).map_err(|e| ProviderError::Protocol {
        message: format!("serializing output: {e}"),
    })
}
