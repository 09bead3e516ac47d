//! Templates command - inspect the loaded template registry.

use clap::{Args, Subcommand};
use console::style;

use docroi_core::{DocumentType, Side, Subtype, TemplateRegistry};

use super::load_config;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List registered templates and their fields
    List,

    /// Print one template as JSON
    Show {
        /// Document type (id-card, report)
        doc_type: DocumentType,

        /// Layout subtype (TYPE_1, TYPE_2, TYPE_3)
        subtype: Subtype,

        /// Card side (ID cards only)
        side: Option<Side>,
    },
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = TemplateRegistry::from_config(&config.templates)?;

    match args.command {
        TemplatesCommand::List => list_templates(&registry),
        TemplatesCommand::Show {
            doc_type,
            subtype,
            side,
        } => show_template(&registry, doc_type, subtype, side),
    }
}

fn list_templates(registry: &TemplateRegistry) -> anyhow::Result<()> {
    if registry.is_empty() {
        println!("{} No templates registered.", style("ℹ").blue());
        return Ok(());
    }

    println!("{}", style("Registered templates:").bold());
    println!();

    for key in registry.keys() {
        let Some(template) = registry.get(&key) else {
            continue;
        };
        let fields: Vec<&str> = template.iter().map(|(name, _)| name).collect();
        println!(
            "  {} {}",
            style(key.to_string()).cyan(),
            style(format!("({})", fields.join(", "))).dim()
        );
    }

    println!();
    println!("{} templates", registry.len());

    Ok(())
}

fn show_template(
    registry: &TemplateRegistry,
    doc_type: DocumentType,
    subtype: Subtype,
    side: Option<Side>,
) -> anyhow::Result<()> {
    let template = registry.lookup(doc_type, subtype, side)?;
    println!("{}", serde_json::to_string_pretty(template)?);
    Ok(())
}
