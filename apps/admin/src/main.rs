mod config;

use std::{
    io::{self, BufRead},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AdminError, AdminScreen, FormInput, Interaction, RemoveOutcome, RestTransport, ScreenBuilder,
    SessionState,
};
use shared::{
    domain::{display_value, FieldKind, RecordKey},
    registry::EntityRegistry,
};
use tracing::info;

use crate::config::{load_settings, normalize_api_url};

#[derive(Parser, Debug)]
#[command(name = "admin", about = "Retail back-office administration")]
struct Cli {
    /// Base URL of the REST backend.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the manageable entities.
    Entities,
    List {
        entity: String,
    },
    Show {
        entity: String,
        id: String,
    },
    Create {
        entity: String,
        #[arg(short = 'f', long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    Edit {
        entity: String,
        id: String,
        #[arg(short = 'f', long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    Delete {
        entity: String,
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Public product catalog.
    Catalog,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

/// Prompts on stderr and reads the answer from stdin.
struct TerminalInteraction {
    assume_yes: bool,
}

impl Interaction for TerminalInteraction {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [s/N] ");
        read_confirmation(io::stdin().lock())
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Unreadable input and anything but an explicit yes decline.
fn read_confirmation(mut input: impl BufRead) -> bool {
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = &cli.api_url {
        settings.api_base_url = normalize_api_url(url);
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(io::stderr)
        .init();
    info!(api = %settings.api_base_url, "admin client starting");

    let assume_yes = matches!(cli.command, Command::Delete { yes: true, .. });
    let transport = RestTransport::new(&settings.api_base_url)
        .with_context(|| format!("invalid api url '{}'", settings.api_base_url))?;
    let builder = ScreenBuilder::new(
        EntityRegistry::standard(),
        Arc::new(transport),
        Arc::new(TerminalInteraction { assume_yes }),
    );

    match cli.command {
        Command::Entities => {
            for descriptor in builder.registry().iter() {
                let fields: Vec<&str> = descriptor
                    .form_fields(true)
                    .into_iter()
                    .map(|field| field.name)
                    .collect();
                println!(
                    "{:<14} /{:<14} {}",
                    descriptor.name,
                    descriptor.resource_path,
                    fields.join(", ")
                );
            }
        }
        Command::List { entity } => {
            let mut screen = builder.build(&entity)?;
            let mounted = screen.mount().await;
            println!("{}", screen.heading());
            print!("{}", screen.render());
            mounted?;
        }
        Command::Show { entity, id } => {
            let mut screen = builder.build(&entity)?;
            screen.mount().await?;
            screen.open_view(&RecordKey::from(id.as_str()))?;
            print_record(&screen);
        }
        Command::Create { entity, fields } => {
            let mut screen = builder.build(&entity)?;
            screen.mount().await?;
            screen.open_create();
            submit(&mut screen, fields).await?;
        }
        Command::Edit { entity, id, fields } => {
            let mut screen = builder.build(&entity)?;
            screen.mount().await?;
            screen.open_edit(&RecordKey::from(id.as_str()))?;
            submit(&mut screen, fields).await?;
        }
        Command::Delete { entity, id, .. } => {
            let mut screen = builder.build(&entity)?;
            screen.mount().await?;
            match screen.delete(&RecordKey::from(id.as_str())).await? {
                RemoveOutcome::Removed => print!("{}", screen.render()),
                RemoveOutcome::Cancelled => println!("cancelado"),
            }
        }
        Command::Catalog => {
            let mut catalog = builder.catalog()?;
            let loaded = catalog.load().await;
            print!("{}", catalog.render());
            loaded?;
        }
    }

    Ok(())
}

async fn submit(screen: &mut AdminScreen, fields: Vec<(String, String)>) -> Result<()> {
    let overrides: FormInput = fields.into_iter().collect();
    if let Some(title) = screen.form_title() {
        println!("{title}");
    }
    let input = screen.form_defaults().merged(&overrides);

    match screen.submit(&input).await {
        Ok(()) => {
            print!("{}", screen.render());
            Ok(())
        }
        Err(AdminError::Validation(errors)) => {
            for violation in errors.violations() {
                eprintln!("  {violation}");
            }
            bail!("formulario inválido")
        }
        Err(err) => Err(err.into()),
    }
}

fn print_record(screen: &AdminScreen) {
    let SessionState::Viewing(record) = screen.session() else {
        return;
    };
    let descriptor = screen.descriptor();
    if let Some(title) = screen.form_title() {
        println!("{title}");
    }
    println!(
        "  {}: {}",
        descriptor.labels.id_header,
        record.display(descriptor.id_field)
    );
    for field in descriptor.fields {
        if field.kind == FieldKind::Password {
            continue;
        }
        let value = record.get(field.name).cloned().unwrap_or_default();
        let shown = match field.kind {
            FieldKind::Reference => screen.resolve(field.name, &value),
            _ => display_value(&value),
        };
        println!("  {}: {shown}", field.label);
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
