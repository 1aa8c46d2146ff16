//! Lorebook CLI - Local documentation and content management for game-development teams.

use clap::Parser;
use lorebook::cli::{
    CharacterCommands, Cli, Commands, ConfigCommands, DialogueCommands, DiagramCommands,
    FileCommands, IdeaAddArgs, IdeaCommands, PrdCommands, RecordCommands, TaskAddArgs,
    TaskCommands,
};
use lorebook::commands::{self, Output};
use lorebook::config::{ConfigOverrides, Settings};
use lorebook::logging::init_logging;
use lorebook::models::{
    Collection, IdeaCategory, IdeaDraft, ListField, ScoreInput, ScoreValue, TaskDraft, TaskStatus,
};
use lorebook::storage::{DiagramRequest, Storage};
use std::io::Read;
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let result = load_settings(&cli).and_then(|settings| {
        let _guard = init_logging(cli.log_json, settings.log_dir());
        tracing::debug!(root = %settings.root.display(), "Resolved settings");
        run_command(cli.command, &settings, human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve settings from the root flag (or `LORE_ROOT`), serve overrides and config files.
fn load_settings(cli: &Cli) -> Result<Settings, lorebook::Error> {
    let mut overrides = ConfigOverrides::new();
    if let Some(ref root) = cli.root {
        if !root.is_dir() {
            return Err(lorebook::Error::InvalidInput(format!(
                "Specified root does not exist: {}",
                root.display()
            )));
        }
        overrides = overrides.with_root(root);
    }
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            overrides = overrides.with_host(host);
        }
        if let Some(port) = port {
            overrides = overrides.with_port(*port);
        }
    }
    Settings::load(&overrides)
}

fn run_command(command: Commands, settings: &Settings, human: bool) -> Result<(), lorebook::Error> {
    match command {
        Commands::Init => output(&commands::init(settings)?, human),

        Commands::Serve { .. } => run_server(settings)?,

        Commands::Idea { command } => {
            let storage = Storage::open(settings);
            match command {
                IdeaCommands::List => output(&commands::idea_list(&storage)?, human),
                IdeaCommands::Add(args) => {
                    let draft = idea_draft(args)?;
                    output(&commands::idea_add(&storage, &draft)?, human)
                }
                IdeaCommands::Show { id } => output(&commands::idea_show(&storage, &id)?, human),
            }
        }

        Commands::Task { command } => {
            let storage = Storage::open(settings);
            match command {
                TaskCommands::List { status } => {
                    output(&commands::task_list(&storage, status.as_deref())?, human)
                }
                TaskCommands::Add(args) => {
                    let draft = task_draft(args)?;
                    output(&commands::task_add(&storage, &draft)?, human)
                }
                TaskCommands::Move { id, status } => {
                    output(&commands::task_move(&storage, &id, &status)?, human)
                }
                TaskCommands::Show { id } => output(&commands::task_show(&storage, &id)?, human),
            }
        }

        Commands::Prd { command } => match command {
            PrdCommands::List => output(&commands::prd_list(&Storage::open(settings))?, human),
        },

        Commands::Record { command } => {
            let mut storage = Storage::open(settings);
            match command {
                RecordCommands::List { collection } => {
                    let collection: Collection = collection.parse()?;
                    output(&commands::record_list(&storage, collection)?, human)
                }
                RecordCommands::Put { collection, json } => {
                    let collection: Collection = collection.parse()?;
                    let text = match json.as_deref() {
                        None | Some("-") => read_stdin()?,
                        Some(text) => text.to_string(),
                    };
                    let record: serde_json::Value = serde_json::from_str(&text)?;
                    output(&commands::record_put(&mut storage, collection, record)?, human)
                }
                RecordCommands::Get { collection, id } => {
                    let collection: Collection = collection.parse()?;
                    output(&commands::record_get(&storage, collection, &id)?, human)
                }
            }
        }

        Commands::Search { query } => {
            output(&commands::search(&Storage::open(settings), &query)?, human)
        }

        Commands::File { command } => {
            let storage = Storage::open(settings);
            match command {
                FileCommands::Get { path } => output(&commands::file_get(&storage, &path)?, human),
                FileCommands::Put { path, content } => {
                    let content = match content {
                        Some(content) => content,
                        None => read_stdin()?,
                    };
                    output(&commands::file_put(&storage, &path, &content)?, human)
                }
            }
        }

        Commands::Diagram { command } => match command {
            DiagramCommands::Render {
                source,
                name,
                diagram_type,
                tags,
            } => {
                let code = read_source(source.as_deref())?;
                let request = DiagramRequest {
                    code: Some(code),
                    name,
                    diagram_type,
                    tags: (!tags.is_empty()).then_some(ListField::Items(tags)),
                };
                let mut storage = Storage::open(settings);
                output(&commands::diagram_render(&mut storage, request)?, human)
            }
        },

        Commands::Dialogue { command } => match command {
            DialogueCommands::Export { id } => {
                output(&commands::dialogue_export(&Storage::open(settings), &id)?, human)
            }
        },

        Commands::Character { command } => match command {
            CharacterCommands::Graph => {
                output(&commands::character_graph(&Storage::open(settings))?, human)
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(settings), human),
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn read_stdin() -> Result<String, lorebook::Error> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Read a source file, or stdin for `None` and `-`.
fn read_source(path: Option<&Path>) -> Result<String, lorebook::Error> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => read_stdin(),
    }
}

fn list_field(items: Vec<String>) -> Option<ListField> {
    (!items.is_empty()).then_some(ListField::Items(items))
}

fn idea_draft(args: IdeaAddArgs) -> Result<IdeaDraft, lorebook::Error> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<IdeaCategory>)
        .transpose()?;
    let score = |value: Option<i64>| value.map(ScoreValue::Number);

    Ok(IdeaDraft {
        title: Some(args.title),
        category,
        status: args.status,
        summary: args.summary,
        description: args.description,
        notes: list_field(args.notes),
        tags: list_field(args.tags),
        score: ScoreInput {
            impact: score(args.impact),
            feasibility: score(args.feasibility),
            originality: score(args.originality),
            player_value: score(args.player_value),
            alignment: score(args.alignment),
            total: None,
        },
    })
}

fn task_draft(args: TaskAddArgs) -> Result<TaskDraft, lorebook::Error> {
    let status = args.status.as_deref().map(str::parse::<TaskStatus>).transpose()?;

    Ok(TaskDraft {
        id: args.id,
        title: Some(args.title),
        task_type: args.task_type,
        status,
        estimated_time: args.estimate,
        milestone: args.milestone,
        priority: args.priority,
        description: args.description,
        objective: args.objective,
        acceptance_criteria: list_field(args.acceptance_criteria),
        implementation_notes: list_field(args.implementation_notes),
        dependencies: list_field(args.dependencies),
        testing_plan: list_field(args.testing_plan),
        next_steps: list_field(args.next_steps),
    })
}

/// Run the HTTP server until Ctrl+C.
#[cfg(feature = "server")]
fn run_server(settings: &Settings) -> Result<(), lorebook::Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| lorebook::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(lorebook::server::start_server(settings.clone()))
}

#[cfg(not(feature = "server"))]
fn run_server(_settings: &Settings) -> Result<(), lorebook::Error> {
    Err(lorebook::Error::Other(
        "This build of lore was compiled without the server feature".to_string(),
    ))
}
