use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use visitenkarte::{
    CardSession, CardTemplate, ContactRecord, DirectoryTarget, ExportConfig, ExportMode, Location,
    POSITIONS,
};

#[derive(Parser)]
#[command(name = "visitenkarte", version, about = "Create business cards as PDF or ZIP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the card and write it to disk
    Export {
        #[command(flatten)]
        contact: ContactArgs,
        /// JSON configuration file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        mode: Option<ExportMode>,
        #[arg(long, value_enum)]
        template: Option<CardTemplate>,
        /// PNG logo for the front face
        #[arg(long)]
        logo: Option<PathBuf>,
        /// Output directory
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Settle delay before capturing a revealed face, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,
    },
    /// Print the vCard payload encoded into the QR code
    Vcard {
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// List the predefined positions and locations
    Options,
}

#[derive(Args)]
struct ContactArgs {
    /// Start from a JSON contact file (camelCase keys)
    #[arg(long)]
    contact: Option<PathBuf>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    position: Option<String>,
    /// One of the predefined sites; sets the address
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    fax: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    website: Option<String>,
    /// Free-text address, applied after --location
    #[arg(long)]
    address: Option<String>,
}

impl ContactArgs {
    fn into_record(self) -> Result<ContactRecord> {
        let mut record = match &self.contact {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading contact file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing contact file {}", path.display()))?
            }
            None => ContactRecord::new(),
        };
        let fields = [
            (self.first_name, &mut record.first_name),
            (self.last_name, &mut record.last_name),
            (self.position, &mut record.position),
            (self.phone, &mut record.phone),
            (self.fax, &mut record.fax),
            (self.email, &mut record.email),
            (self.company, &mut record.company),
            (self.website, &mut record.website),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(location) = self.location {
            if location.parse::<Location>().is_err() {
                log::warn!("unknown location '{}', clearing the address", location);
            }
            record.select_location(&location);
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if !record.position.is_empty() && !record.has_known_position() {
            log::info!("using free-text position '{}'", record.position);
        }
        Ok(record)
    }
}

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(err) = run(Cli::parse()).await {
        log::error!("{:#}", err);
        eprintln!("Fehler: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export {
            contact,
            config,
            mode,
            template,
            logo,
            out,
            settle_ms,
        } => {
            let mut cfg = match config {
                Some(path) => ExportConfig::from_json_file(&path)
                    .with_context(|| format!("loading configuration {}", path.display()))?,
                None => ExportConfig::default(),
            };
            if let Some(mode) = mode {
                cfg.mode = mode;
            }
            if let Some(template) = template {
                cfg.template = template;
            }
            if logo.is_some() {
                cfg.logo_path = logo;
            }
            if let Some(out) = out {
                cfg.output_dir = out;
            }
            if let Some(ms) = settle_ms {
                cfg.settle_delay_ms = ms;
            }

            let mut session = CardSession::new(contact.into_record()?);
            let target = DirectoryTarget::new(cfg.output_dir.clone());
            let pipeline = visitenkarte::new_pipeline(cfg)?;
            let path = pipeline
                .export_and_save(&mut session, &target)
                .await
                .context("export failed")?;
            println!("{}", path.display());
        }
        Command::Vcard { contact } => {
            let record = contact.into_record()?;
            println!("{}", visitenkarte::vcard::encode(&record));
        }
        Command::Options => {
            println!("Positionen:");
            for p in POSITIONS {
                println!("  {}", p);
            }
            println!("Standorte:");
            for loc in Location::ALL {
                println!("  {:<16} {}", loc.label(), loc.address());
            }
        }
    }
    Ok(())
}
