//! CLI argument definitions for Lorebook.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lorebook - Local documentation and content management for game-development teams.
///
/// Run `lore init` once in a project, then `lore serve` for the web API or use
/// the subcommands directly.
#[derive(Parser, Debug)]
#[command(name = "lore")]
#[command(author, version, about = "Ideas, tasks, story records and docs for game-development teams", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if lore was started in <path> instead of the current directory.
    /// Can also be set via LORE_ROOT environment variable.
    #[arg(short = 'C', long = "root", global = true, env = "LORE_ROOT")]
    pub root: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the docs, data and uploads folders and a lorebook.kdl
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "LORE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "LORE_PORT")]
        port: Option<u16>,
    },

    /// Idea management commands
    Idea {
        #[command(subcommand)]
        command: IdeaCommands,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Product requirements documents
    Prd {
        #[command(subcommand)]
        command: PrdCommands,
    },

    /// Story records (characters, locations, quests, dialogues, story-arcs, images, diagrams)
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Search characters, locations, quests, dialogues and story arcs
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// Read or write files under the docs directory
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Diagram commands
    Diagram {
        #[command(subcommand)]
        command: DiagramCommands,
    },

    /// Dialogue commands
    Dialogue {
        #[command(subcommand)]
        command: DialogueCommands,
    },

    /// Character commands
    Character {
        #[command(subcommand)]
        command: CharacterCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Idea subcommands
#[derive(Subcommand, Debug)]
pub enum IdeaCommands {
    /// List ideas, highest score first
    List,

    /// Create or overwrite an idea
    Add(IdeaAddArgs),

    /// Show one idea
    Show {
        /// Idea ID (<category>/<slug>, e.g. Gameplay/double-jump)
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct IdeaAddArgs {
    /// Idea title
    pub title: String,

    /// Category (Gameplay, UI, Graphics, Sound, Economy, Story, Technical, Meta)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Status (default: Brainstorming)
    #[arg(short, long)]
    pub status: Option<String>,

    /// One-paragraph summary
    #[arg(long)]
    pub summary: Option<String>,

    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Note line (repeatable)
    #[arg(long = "note")]
    pub notes: Vec<String>,

    /// Tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Impact score
    #[arg(long)]
    pub impact: Option<i64>,

    /// Feasibility score
    #[arg(long)]
    pub feasibility: Option<i64>,

    /// Originality score
    #[arg(long)]
    pub originality: Option<i64>,

    /// Player value score
    #[arg(long)]
    pub player_value: Option<i64>,

    /// Alignment score
    #[arg(long)]
    pub alignment: Option<i64>,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks, most recently modified first
    List {
        /// Only tasks with this status (Backlog, NextUp, InProgress, Review, Done, or custom)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Create a task, or rewrite an existing one with --id
    Add(TaskAddArgs),

    /// Move a task to another status
    Move {
        /// Task ID (YYYY-MM-DD-NN)
        id: String,

        /// Target status
        status: String,
    },

    /// Show one task
    Show {
        /// Task ID (YYYY-MM-DD-NN)
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct TaskAddArgs {
    /// Task title
    pub title: String,

    /// Rewrite the task with this ID instead of creating a new one
    #[arg(long)]
    pub id: Option<String>,

    /// Task type (e.g. Feature, Bug)
    #[arg(short = 'k', long = "type")]
    pub task_type: Option<String>,

    /// Status (default: Backlog)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Estimated time
    #[arg(short, long)]
    pub estimate: Option<String>,

    /// Milestone
    #[arg(short, long)]
    pub milestone: Option<String>,

    /// Priority
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Objective
    #[arg(short, long)]
    pub objective: Option<String>,

    /// Acceptance criterion (repeatable)
    #[arg(long = "criterion")]
    pub acceptance_criteria: Vec<String>,

    /// Implementation note (repeatable)
    #[arg(long = "note")]
    pub implementation_notes: Vec<String>,

    /// Dependency (repeatable)
    #[arg(long = "depends-on")]
    pub dependencies: Vec<String>,

    /// Testing plan step (repeatable)
    #[arg(long = "test-step")]
    pub testing_plan: Vec<String>,

    /// Next step (repeatable)
    #[arg(long = "next-step")]
    pub next_steps: Vec<String>,
}

/// PRD subcommands
#[derive(Subcommand, Debug)]
pub enum PrdCommands {
    /// List PRD documents
    List,
}

/// Record subcommands
#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// List all records of a collection
    List {
        /// Collection name (e.g. characters, story-arcs)
        collection: String,
    },

    /// Insert or update a record from a JSON object
    Put {
        /// Collection name
        collection: String,

        /// JSON object; read from stdin when omitted or "-"
        json: Option<String>,
    },

    /// Show one record
    Get {
        /// Collection name
        collection: String,

        /// Record ID
        id: String,
    },
}

/// File subcommands
#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Print a file relative to the docs directory
    Get {
        /// Relative path (e.g. Story/intro.md)
        path: String,
    },

    /// Write a file relative to the docs directory
    Put {
        /// Relative path
        path: String,

        /// File content; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
    },
}

/// Diagram subcommands
#[derive(Subcommand, Debug)]
pub enum DiagramCommands {
    /// Render mermaid source to SVG and record it
    Render {
        /// Mermaid source file; read from stdin when omitted or "-"
        source: Option<PathBuf>,

        /// Diagram name
        #[arg(short, long)]
        name: Option<String>,

        /// Diagram type (default: flowchart)
        #[arg(short = 'k', long = "type")]
        diagram_type: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

/// Dialogue subcommands
#[derive(Subcommand, Debug)]
pub enum DialogueCommands {
    /// Print the engine export of a dialogue
    Export {
        /// Dialogue ID
        id: String,
    },
}

/// Character subcommands
#[derive(Subcommand, Debug)]
pub enum CharacterCommands {
    /// Show the character relationship graph
    Graph,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved settings and where each value came from
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lore", "idea", "list", "-H", "-C", "/tmp/game"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/game")));
        assert!(matches!(
            cli.command,
            Commands::Idea {
                command: IdeaCommands::List
            }
        ));
    }

    #[test]
    fn test_idea_add_args() {
        let cli = Cli::try_parse_from([
            "lore", "idea", "add", "Double Jump", "-c", "gameplay", "-t", "movement", "-t", "air",
            "--impact", "4",
        ])
        .unwrap();
        let Commands::Idea {
            command: IdeaCommands::Add(args),
        } = cli.command
        else {
            panic!("expected idea add");
        };
        assert_eq!(args.title, "Double Jump");
        assert_eq!(args.category.as_deref(), Some("gameplay"));
        assert_eq!(args.tags, vec!["movement", "air"]);
        assert_eq!(args.impact, Some(4));
        assert_eq!(args.feasibility, None);
    }

    #[test]
    fn test_task_move_args() {
        let cli = Cli::try_parse_from(["lore", "task", "move", "2024-05-01-01", "Done"]).unwrap();
        let Commands::Task {
            command: TaskCommands::Move { id, status },
        } = cli.command
        else {
            panic!("expected task move");
        };
        assert_eq!(id, "2024-05-01-01");
        assert_eq!(status, "Done");
    }
}
