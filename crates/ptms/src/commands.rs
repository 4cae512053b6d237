//! One-shot commands over an opened [`Workspace`].

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ptms_core::{ProjectId, TaskId};
use ptms_storage::Snapshot;
use ptms_tasks::metrics::{PeriodFilter, ProjectMetrics, StatusProductivity};
use ptms_tasks::{Board, ProjectCreateParams, TaskCreateParams, TaskPatch, Workspace};
use serde_json::{Value, json};

use crate::cli::{ProjectCommand, TaskCommand, TimerCommand};
use crate::render;

pub async fn project(ws: &Workspace, command: ProjectCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        ProjectCommand::Create {
            name,
            description,
            start_date,
            end_date,
        } => {
            let project = ws
                .projects()
                .create(ProjectCreateParams {
                    name,
                    description,
                    start_date,
                    end_date,
                    status: None,
                })
                .await?;
            writeln!(out, "{}", project.id)?;
        }
        ProjectCommand::List => {
            for project in ws.projects().list().await {
                writeln!(out, "{}", render::project_line(&project))?;
            }
        }
        ProjectCommand::Delete { id } => {
            let id = ProjectId::from(id);
            if ws.projects().delete(&id).await? {
                writeln!(out, "deleted {id}")?;
            } else {
                anyhow::bail!("Project not found: {id}");
            }
        }
    }
    Ok(())
}

pub async fn task(ws: &Workspace, command: TaskCommand, out: &mut dyn Write) -> Result<()> {
    let tasks = ws.tasks();
    match command {
        TaskCommand::Create {
            project_id,
            title,
            description,
            assignee,
            due_date,
            priority,
        } => {
            let project_id = ProjectId::from(project_id);
            let _ = ws
                .projects()
                .get(&project_id)
                .await
                .with_context(|| format!("Cannot add a task to {project_id}"))?;
            let task = tasks
                .create(TaskCreateParams {
                    description,
                    assignee,
                    due_date,
                    priority,
                    ..TaskCreateParams::new(project_id, title)
                })
                .await?;
            writeln!(out, "{}", task.id)?;
        }
        TaskCommand::List { project } => {
            let now = ws.clock().now();
            let list = match project {
                Some(id) => tasks.list_for_project(&ProjectId::from(id)).await,
                None => tasks.list().await,
            };
            for task in &list {
                writeln!(out, "{}  {}", task.status, render::task_line(task, now))?;
            }
        }
        TaskCommand::Move { id, status } => {
            let task = tasks.transition(&TaskId::from(id), status).await?;
            writeln!(out, "{} -> {}", task.id, task.status)?;
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            assignee,
            due_date,
            priority,
        } => {
            let patch = TaskPatch {
                title,
                description,
                assignee,
                due_date,
                priority,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to change");
            }
            let task = tasks.update(&TaskId::from(id), patch).await?;
            writeln!(out, "{}", render::task_line(&task, ws.clock().now()))?;
        }
        TaskCommand::Note { id, text } => {
            let task = tasks.add_note(&TaskId::from(id), &text).await?;
            writeln!(out, "{} ({} notes)", task.id, task.notes.len())?;
        }
        TaskCommand::Delete { id } => {
            let id = TaskId::from(id);
            if tasks.delete(&id).await? {
                writeln!(out, "deleted {id}")?;
            } else {
                anyhow::bail!("Task not found: {id}");
            }
        }
    }
    Ok(())
}

pub async fn timer(ws: &Workspace, command: TimerCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        TimerCommand::Toggle { task_id } => {
            let task = ws.tasks().toggle_timer(&TaskId::from(task_id)).await?;
            let state = if task.is_timer_active() { "started" } else { "paused" };
            writeln!(
                out,
                "{} {state}  total {}",
                task.id,
                ptms_core::format_duration(task.time_tracking.total_time)
            )?;
        }
    }
    Ok(())
}

pub async fn board(ws: &Workspace, project_id: String, out: &mut dyn Write) -> Result<()> {
    let project_id = ProjectId::from(project_id);
    let board = Board::project(ws.tasks().list_for_project(&project_id).await);
    writeln!(out, "{}", render::board(&board, ws.clock().now()))?;
    Ok(())
}

pub async fn metrics(
    ws: &Workspace,
    project_id: String,
    period: PeriodFilter,
    out: &mut dyn Write,
) -> Result<()> {
    let project_id = ProjectId::from(project_id);
    let project = ws.projects().get(&project_id).await?;
    let tasks = period.apply(
        &ws.tasks().list_for_project(&project_id).await,
        ws.clock().now(),
    );
    let report = json!({
        "project": project.name,
        "period": period,
        "metrics": ProjectMetrics::compute(&tasks),
        "byStatus": StatusProductivity::compute(&tasks),
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

pub async fn export(ws: &Workspace, file: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    let data = serde_json::to_string_pretty(&ws.export().await?)?;
    match file {
        Some(path) => {
            tokio::fs::write(path, data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "exported to {}", path.display())?;
        }
        None => writeln!(out, "{data}")?,
    }
    Ok(())
}

pub async fn import(ws: &Workspace, file: &Path, out: &mut dyn Write) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let stats = ws.import(Snapshot::from_value(value)?).await?;
    writeln!(
        out,
        "imported {} projects and {} tasks",
        stats.project_count, stats.task_count
    )?;
    Ok(())
}
