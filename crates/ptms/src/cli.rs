//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ptms_core::{TaskPriority, TaskStatus};
use ptms_tasks::metrics::PeriodFilter;

/// Project-TMS task board.
#[derive(Parser, Debug)]
#[command(name = "ptms", about = "Project-TMS task board and file server")]
pub struct Cli {
    /// Settings file (defaults to `~/.ptms/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the JSON file server.
    Serve {
        /// Host to bind.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (0 for auto-assign).
        #[arg(long)]
        port: Option<u16>,
        /// Directory holding the collection files.
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Time tracking.
    #[command(subcommand)]
    Timer(TimerCommand),
    /// Print a project's board.
    Board {
        /// Project to show.
        project_id: String,
    },
    /// Print a project's metrics as JSON.
    Metrics {
        /// Project to analyse.
        project_id: String,
        /// Only tasks updated in this window: all, month or week.
        #[arg(long, default_value = "all")]
        period: PeriodFilter,
    },
    /// Export every collection as JSON.
    Export {
        /// Output file (stdout when omitted).
        file: Option<PathBuf>,
    },
    /// Replace projects and tasks from an export file.
    Import {
        /// File produced by `export`.
        file: PathBuf,
    },
    /// Follow a project's board and the running timer until Ctrl-C.
    Watch {
        /// Project to follow.
        project_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project.
    Create {
        /// Project name.
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    /// List projects.
    List,
    /// Delete a project and all of its tasks.
    Delete {
        /// Project to delete.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task.
    Create {
        /// Owning project.
        project_id: String,
        /// Task title.
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
        /// low, medium or high.
        #[arg(long)]
        priority: Option<TaskPriority>,
    },
    /// List tasks, optionally for one project.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Move a task to another column.
    Move {
        /// Task to move.
        id: String,
        /// todo, in-progress, review or done.
        status: TaskStatus,
    },
    /// Change task fields. A blank value clears an optional field.
    Edit {
        /// Task to edit.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
    },
    /// Append a note.
    Note {
        /// Task to annotate.
        id: String,
        /// Note text.
        text: String,
    },
    /// Delete a task.
    Delete {
        /// Task to delete.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TimerCommand {
    /// Start or pause the timer of an in-progress task.
    Toggle {
        /// Task whose timer to toggle.
        task_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_to_settings() {
        let cli = Cli::parse_from(["ptms", "serve"]);
        assert!(matches!(
            cli.command,
            Command::Serve {
                host: None,
                port: None,
                storage_dir: None
            }
        ));
    }

    #[test]
    fn serve_overrides() {
        let cli = Cli::parse_from([
            "ptms",
            "serve",
            "--port",
            "8080",
            "--storage-dir",
            "/tmp/storage",
        ]);
        let Command::Serve {
            port, storage_dir, ..
        } = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(port, Some(8080));
        assert_eq!(storage_dir, Some(PathBuf::from("/tmp/storage")));
    }

    #[test]
    fn task_move_parses_status() {
        let cli = Cli::parse_from(["ptms", "task", "move", "task-1", "in-progress"]);
        let Command::Task(TaskCommand::Move { id, status }) = cli.command else {
            panic!("expected task move");
        };
        assert_eq!(id, "task-1");
        assert_eq!(status, TaskStatus::InProgress);
    }

    #[test]
    fn task_move_rejects_unknown_status() {
        let err = Cli::try_parse_from(["ptms", "task", "move", "task-1", "blocked"]).unwrap_err();
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn task_create_with_priority() {
        let cli = Cli::parse_from([
            "ptms", "task", "create", "proj-1", "Write docs", "--priority", "high",
        ]);
        let Command::Task(TaskCommand::Create {
            project_id,
            title,
            priority,
            ..
        }) = cli.command
        else {
            panic!("expected task create");
        };
        assert_eq!(project_id, "proj-1");
        assert_eq!(title, "Write docs");
        assert_eq!(priority, Some(TaskPriority::High));
    }

    #[test]
    fn metrics_period_defaults_to_all() {
        let cli = Cli::parse_from(["ptms", "metrics", "proj-1"]);
        assert!(matches!(
            cli.command,
            Command::Metrics {
                period: PeriodFilter::All,
                ..
            }
        ));

        let cli = Cli::parse_from(["ptms", "metrics", "proj-1", "--period", "week"]);
        assert!(matches!(
            cli.command,
            Command::Metrics {
                period: PeriodFilter::Week,
                ..
            }
        ));
    }

    #[test]
    fn settings_flag_is_global() {
        let cli = Cli::parse_from(["ptms", "board", "proj-1", "--settings", "/tmp/s.json"]);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn timer_toggle() {
        let cli = Cli::parse_from(["ptms", "timer", "toggle", "task-9"]);
        assert!(matches!(
            cli.command,
            Command::Timer(TimerCommand::Toggle { task_id }) if task_id == "task-9"
        ));
    }
}
