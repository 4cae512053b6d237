//! Long-running commands: the file server and the watch session.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use ptms_core::{Project, ProjectId};
use ptms_server::{FileServer, ServerConfig};
use ptms_tasks::Workspace;
use ptms_tasks::watch::{spawn_board_refresher, spawn_timer_ticker};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::render;

/// Serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let server = FileServer::new(config);
    let handle = server
        .listen()
        .await
        .context("Failed to start file server")?;
    println!("ptms file server listening on http://{}", handle.addr());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("shutting down");
    if !handle.shutdown().await {
        warn!("file server did not stop within the grace period");
    }
    Ok(())
}

/// Print the board on every recompute and the running timer on every tick.
///
/// Ends on Ctrl-C, when `stop` is cancelled, or when output fails; in every
/// case a running timer is committed before returning.
pub async fn watch(
    ws: &Workspace,
    project_id: ProjectId,
    tick: Duration,
    stop: CancellationToken,
    out: &mut dyn Write,
) -> Result<()> {
    let project = ws.projects().get(&project_id).await?;

    let token = stop.child_token();
    let outcome = follow(ws, &project, tick, &stop, &token, out).await;
    token.cancel();

    let flushed = ws
        .tasks()
        .flush_active_timer_on_unload(ws.clock().now())
        .await
        .context("Failed to stop the running timer");
    if let (Err(_), Err(e)) = (&outcome, &flushed) {
        warn!(error = %format!("{e:#}"), "timer flush failed after watch error");
    }
    outcome?;

    if let Some(task) = flushed? {
        writeln!(
            out,
            "stopped timer on {} at {}",
            task.id,
            ptms_core::format_duration(task.time_tracking.total_time)
        )?;
    }
    Ok(())
}

async fn follow(
    ws: &Workspace,
    project: &Project,
    tick: Duration,
    stop: &CancellationToken,
    token: &CancellationToken,
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "watching {} ({})", project.name, project.id)?;

    let mut boards = spawn_board_refresher(
        ws.tasks().clone(),
        ws.bus(),
        project.id.clone(),
        token.clone(),
    )
    .await;
    let mut timers = spawn_timer_ticker(ws.tasks().clone(), ws.clock().clone(), tick, token.clone());

    let board = boards.borrow_and_update().clone();
    writeln!(out, "{}", render::board(&board, ws.clock().now()))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for ctrl-c")?;
                return Ok(());
            }
            () = stop.cancelled() => return Ok(()),
            changed = boards.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let board = boards.borrow_and_update().clone();
                writeln!(out, "{}", render::board(&board, ws.clock().now()))?;
            }
            changed = timers.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let active = timers.borrow_and_update().clone();
                if let Some(timer) = active {
                    writeln!(out, "{}", render::timer(&timer))?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use ptms_core::{ManualClock, TaskStatus};
    use ptms_events::EventBus;
    use ptms_storage::LocalStore;
    use ptms_tasks::{ProjectCreateParams, TaskCreateParams};

    use super::*;

    #[tokio::test]
    async fn watch_flushes_running_timer_on_exit() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let ws = Workspace::open(
            Arc::new(LocalStore::in_memory()),
            Arc::new(EventBus::new()),
            clock.clone(),
        )
        .await
        .unwrap();
        let project = ws
            .projects()
            .create(ProjectCreateParams {
                name: "Website".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let task = ws
            .tasks()
            .create(TaskCreateParams::new(project.id.clone(), "Landing page"))
            .await
            .unwrap();
        let _ = ws
            .tasks()
            .transition(&task.id, TaskStatus::InProgress)
            .await
            .unwrap();
        let _ = ws.tasks().toggle_timer(&task.id).await.unwrap();
        clock.advance_ms(25 * 60 * 1000);

        let stop = CancellationToken::new();
        stop.cancel();
        let mut out = Vec::new();
        watch(
            &ws,
            project.id.clone(),
            Duration::from_secs(1),
            stop,
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("watching Website"));
        assert!(text.contains("In Progress (1)"));
        assert!(text.contains(&format!("stopped timer on {} at 0h 25m", task.id)));

        let stored = ws.tasks().get(&task.id).await.unwrap();
        assert!(!stored.is_timer_active());
        assert_eq!(stored.time_tracking.total_time, 25 * 60 * 1000);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn watch_flushes_timer_when_output_breaks() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let ws = Workspace::open(
            Arc::new(LocalStore::in_memory()),
            Arc::new(EventBus::new()),
            clock.clone(),
        )
        .await
        .unwrap();
        let project = ws
            .projects()
            .create(ProjectCreateParams {
                name: "Website".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let task = ws
            .tasks()
            .create(TaskCreateParams::new(project.id.clone(), "Landing page"))
            .await
            .unwrap();
        let _ = ws
            .tasks()
            .transition(&task.id, TaskStatus::InProgress)
            .await
            .unwrap();
        let _ = ws.tasks().toggle_timer(&task.id).await.unwrap();
        clock.advance_ms(10 * 60 * 1000);

        let result = watch(
            &ws,
            project.id.clone(),
            Duration::from_secs(1),
            CancellationToken::new(),
            &mut BrokenPipe,
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<std::io::Error>().map(std::io::Error::kind),
            Some(std::io::ErrorKind::BrokenPipe)
        );

        let stored = ws.tasks().get(&task.id).await.unwrap();
        assert!(!stored.is_timer_active());
        assert_eq!(stored.time_tracking.total_time, 10 * 60 * 1000);
    }

    #[tokio::test]
    async fn watch_requires_known_project() {
        let ws = Workspace::open(
            Arc::new(LocalStore::in_memory()),
            Arc::new(EventBus::new()),
            Arc::new(ptms_core::SystemClock),
        )
        .await
        .unwrap();
        let mut out = Vec::new();
        let result = watch(
            &ws,
            "proj-nope".into(),
            Duration::from_secs(1),
            CancellationToken::new(),
            &mut out,
        )
        .await;
        assert!(result.is_err());
    }
}
