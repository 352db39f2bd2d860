use anyhow::Result;
use clap::Args;
use colored::Colorize;
use procflow_palette::{PaletteAction, PaletteProvider};

#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn palette(args: PaletteArgs, _cwd: &str) -> Result<()> {
    let provider = PaletteProvider::new();

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(provider.entries())?);
        }
        "text" => {
            let mut group = "";
            for entry in provider.entries() {
                if entry.group != group {
                    group = entry.group;
                    println!("{}", group.bold());
                }

                if entry.separator {
                    println!("   {}", "──────".dimmed());
                    continue;
                }

                let kind = match &entry.action {
                    Some(PaletteAction::Tool { tool }) => format!("tool:{}", tool),
                    Some(PaletteAction::CreateShape { element_type, .. }) => {
                        format!("create:{}", element_type.short_name())
                    }
                    Some(PaletteAction::CreateSubProcess) => "create:SubProcess+StartEvent".into(),
                    Some(PaletteAction::CreateParticipant) => "create:Participant".into(),
                    None => String::new(),
                };

                println!(
                    "   {:<28} {:<34} {}",
                    entry.key.cyan(),
                    entry.title.as_deref().unwrap_or(""),
                    kind.dimmed()
                );
            }
        }
        other => {
            return Err(anyhow::anyhow!(
                "Invalid format: {}. Use: text or json",
                other
            ));
        }
    }

    Ok(())
}
