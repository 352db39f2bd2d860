use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use procflow_editor::model::{DefinitionId, ElementId, ShapeOptions};
use procflow_editor::{EditSession, EditorConfig, EditorError, PasteTarget};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::script::{Script, Step};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON script of edit steps
    pub script: PathBuf,

    /// Directory containing procflow.config.json (defaults to cwd)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the final snapshot as JSON only
    #[arg(long)]
    pub json: bool,
}

pub fn replay(args: ReplayArgs, cwd: &str) -> Result<()> {
    let config_dir = args.config.clone().unwrap_or_else(|| PathBuf::from(cwd));
    let config = EditorConfig::load(&config_dir)
        .with_context(|| format!("Failed to load config from {}", config_dir.display()))?;

    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&source)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    if !args.json {
        println!("▶️  {} {}", "Replaying".green().bold(), args.script.display());
        println!("   Document: {}", script.name);
        println!("   Steps:    {}", script.steps.len());
        println!();
    }

    let mut replayer = Replayer::new(&script.name, &config);

    for (index, step) in script.steps.iter().enumerate() {
        match replayer.run(step) {
            Ok(detail) => {
                if !args.json {
                    println!("   {} {:>3} {} {}", "✓".green(), index + 1, step.name(), detail);
                }
            }
            Err(err) if is_boundary(&err) => {
                if !args.json {
                    println!(
                        "   {} {:>3} {} {}",
                        "•".yellow(),
                        index + 1,
                        step.name(),
                        format!("({})", err).yellow()
                    );
                }
            }
            Err(err) => {
                return Err(err.context(format!("Step {} ({}) failed", index + 1, step.name())));
            }
        }
    }

    let snapshot = replayer.session.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!();
    println!("✨ {} Replay complete!", "Done".green().bold());
    println!("   Elements: {}", snapshot.elements.len());
    println!("   Root definitions: {}", snapshot.root_definitions.len());
    for definition in &snapshot.root_definitions {
        println!(
            "     {} {} {}",
            "-".dimmed(),
            definition.id,
            definition.name.as_deref().unwrap_or("").dimmed()
        );
    }

    Ok(())
}

fn is_boundary(err: &anyhow::Error) -> bool {
    err.downcast_ref::<EditorError>()
        .map(EditorError::is_boundary)
        .unwrap_or(false)
}

/// Runs script steps against one session, resolving `as` names
struct Replayer {
    session: EditSession,
    elements: HashMap<String, ElementId>,
    definitions: HashMap<String, DefinitionId>,
}

impl Replayer {
    fn new(name: &str, config: &EditorConfig) -> Self {
        Self {
            session: EditSession::with_config(name, config),
            elements: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    fn element(&self, name: &str) -> ElementId {
        self.elements
            .get(name)
            .cloned()
            .unwrap_or_else(|| ElementId::new(name))
    }

    fn elements(&self, names: &[String]) -> Vec<ElementId> {
        names.iter().map(|name| self.element(name)).collect()
    }

    fn definition(&self, name: &str) -> DefinitionId {
        self.definitions
            .get(name)
            .cloned()
            .unwrap_or_else(|| DefinitionId::new(name))
    }

    fn bind(&mut self, alias: &Option<String>, id: &ElementId) {
        if let Some(alias) = alias {
            self.elements.insert(alias.clone(), id.clone());
        }
    }

    /// Run one step; returns a short description of what it did
    fn run(&mut self, step: &Step) -> Result<String> {
        debug!(step = step.name(), "Running replay step");

        let detail = match step {
            Step::Define { alias, kind, name } => {
                let id = self.session.define(*kind, name.clone());
                if let Some(alias) = alias {
                    self.definitions.insert(alias.clone(), id.clone());
                }
                id.to_string()
            }

            Step::CreateShape {
                alias,
                element_type,
                position,
                name,
                parent,
                attached_to,
                is_expanded,
                event_definition,
                reference,
            } => {
                let mut options = ShapeOptions::new(*element_type).at(position.x, position.y);
                options.name = name.clone();
                options.parent = parent.as_deref().map(|p| self.element(p));
                options.host = attached_to.as_deref().map(|h| self.element(h));
                options.is_expanded = *is_expanded;
                options.event_definition = *event_definition;
                options.reference = reference.as_deref().map(|r| self.definition(r));

                let id = self.session.create_shape(&options)?;
                self.bind(alias, &id);
                id.to_string()
            }

            Step::Connect {
                alias,
                source,
                target,
                element_type,
            } => {
                let (source, target) = (self.element(source), self.element(target));
                let id = self.session.connect(&source, &target, *element_type)?;
                self.bind(alias, &id);
                id.to_string()
            }

            Step::RemoveShape { element } => {
                let id = self.element(element);
                self.session.remove_shape(&id)?;
                id.to_string()
            }

            Step::SetReference {
                element,
                holder,
                definition,
            } => {
                let id = self.element(element);
                let target = definition.as_deref().map(|d| self.definition(d));
                let detail = match &target {
                    Some(target) => format!("{}[{}] → {}", id, holder, target),
                    None => format!("{}[{}] → none", id, holder),
                };
                self.session.set_reference(&id, *holder, target)?;
                detail
            }

            Step::Move { elements, delta } => {
                let ids = self.elements(elements);
                self.session.move_elements(&ids, *delta)?;
                format!("{} element(s) by ({}, {})", ids.len(), delta.x, delta.y)
            }

            Step::Copy {
                elements,
                definitions,
            } => {
                let ids = self.elements(elements);
                let definitions: Vec<DefinitionId> =
                    definitions.iter().map(|d| self.definition(d)).collect();
                let count = self.session.copy_with_definitions(&ids, &definitions)?;
                format!("{} element(s)", count)
            }

            Step::Paste {
                aliases,
                position,
                parent,
                host,
            } => {
                let target = PasteTarget {
                    position: *position,
                    parent: parent.as_deref().map(|p| self.element(p)),
                    host: host.as_deref().map(|h| self.element(h)),
                };
                let ids = self.session.paste(&target)?;
                for (alias, id) in aliases.iter().zip(&ids) {
                    self.elements.insert(alias.clone(), id.clone());
                }
                format!("{} element(s)", ids.len())
            }

            Step::Undo => {
                self.session.undo()?;
                String::new()
            }

            Step::Redo => {
                self.session.redo()?;
                String::new()
            }
        };

        Ok(detail)
    }
}
