#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use settings_store::config::StoreConfig;
use settings_store::constants::config::ENV_LOG_LEVEL;
use settings_store::settings::{PropertyDecl, Settings, load_schema};
use settings_store::{JsonFileDefaults, PropertyDescriptor, PropertyType, SettingsValue};

#[derive(Parser)]
#[command(name = "settings-store")]
#[command(about = "Inspect and edit typed settings kept in a JSON defaults file")]
#[command(version)]
struct Cli {
    /// Defaults file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    defaults: Option<PathBuf>,

    /// Settings schema to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode property attribute encodings such as 'Ti,GcomputedValue,R'
    Decode {
        #[arg(required = true)]
        encodings: Vec<String>,

        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that open the configured defaults file
#[derive(Subcommand)]
enum StoreCommand {
    /// List declared settings with their current values
    List,

    /// Print the raw value stored under a key
    Get { key: String },

    /// Store a value under a key (declared properties convert to their type)
    Set {
        key: String,

        value: String,

        /// Value type: bool, int, double, string, date, array, ...
        #[arg(long = "type", short = 't', default_value = "string")]
        value_type: String,

        /// Keep an existing value instead of replacing it
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Seed defaults for settings that have no value yet
    EnsureDefaults,

    /// Restore every declared setting to its default
    ResetDefaults,
}

fn init_tracing(config_level: &str) -> Result<()> {
    let log_level = match std::env::var(ENV_LOG_LEVEL)
        .unwrap_or_else(|_| config_level.to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn open_settings(defaults: Option<PathBuf>, schema: Option<PathBuf>, config: &StoreConfig) -> Result<Settings> {
    let defaults_path = defaults.unwrap_or_else(|| config.defaults_path());
    let backend = JsonFileDefaults::open(defaults_path)?;

    let schema: Vec<PropertyDecl> = match schema.or_else(|| config.schema_path.clone()) {
        Some(path) => load_schema(&path)?,
        None => {
            info!("No schema configured, only raw keys are available");
            Vec::new()
        }
    };

    Ok(Settings::from_schema(&schema, &config.key_prefix, backend))
}

fn decode(encodings: &[String], json: bool) -> Result<()> {
    for encoding in encodings {
        let descriptor = PropertyDescriptor::decode(encoding);
        if json {
            println!("{}", serde_json::to_string(&descriptor)?);
            continue;
        }
        println!("{encoding}");
        println!("  type:   {}", descriptor.property_type());
        println!("  flags:  {}", descriptor.flags());
        if let Some(ivar) = descriptor.ivar() {
            println!("  ivar:   {ivar}");
        }
        if let Some(getter) = descriptor.custom_getter() {
            println!("  getter: {getter}");
        }
        if let Some(setter) = descriptor.custom_setter() {
            println!("  setter: {setter}");
        }
    }
    Ok(())
}

fn list(settings: &Settings) {
    if settings.settings_properties().is_empty() {
        println!("No settings declared");
        return;
    }
    for property in settings.settings_properties() {
        let value = property.get(settings.store());
        let marker = if settings.contains(property.defaults_key()) { "" } else { " (unset)" };
        println!(
            "{:<24} {:<10} {} = {}{}",
            property.human_readable_name(),
            property.property_type(),
            property.defaults_key(),
            value,
            marker
        );
    }
}

fn run(command: StoreCommand, defaults: Option<PathBuf>, schema: Option<PathBuf>) -> Result<()> {
    let config = StoreConfig::load().context("Failed to load store configuration")?;
    init_tracing(&config.log_level)?;

    let mut settings = open_settings(defaults, schema, &config)?;

    match command {
        StoreCommand::List => list(&settings),
        StoreCommand::Get { key } => match settings.value_for_key(&key) {
            Some(value) => println!("{value}"),
            None => println!("(not set)"),
        },
        StoreCommand::Set {
            key,
            value,
            value_type,
            no_overwrite,
        } => {
            let property_type = PropertyType::from_name(&value_type)
                .filter(|ty| ty.is_supported())
                .ok_or_else(|| anyhow!("Unknown value type '{}'", value_type))?;
            let value = SettingsValue::parse_as(property_type, &value)?;
            let overwrite = !no_overwrite;

            // Declared properties go through their setter, anything else is a raw key
            if !settings.set_value(&key, value.clone(), overwrite) {
                settings.set_object(value, &key, overwrite);
            }
            settings.synchronize()?;
        }
        StoreCommand::EnsureDefaults => {
            settings.ensure_default_values();
            settings.synchronize()?;
        }
        StoreCommand::ResetDefaults => {
            settings.reset_default_values();
            settings.synchronize()?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let Cli {
        defaults,
        schema,
        command,
    } = Cli::parse();

    match command {
        Commands::Decode { encodings, json } => {
            init_tracing("warn")?;
            decode(&encodings, json)
        }
        Commands::Store(command) => run(command, defaults, schema),
    }
}
