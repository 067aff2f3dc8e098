//! Show scheduled product launches.

use anyhow::Result;
use chrono::Utc;
use curio_commerce::launches::LaunchWatcher;
use serde::Serialize;

use super::LaunchesArgs;
use crate::context::Context;

#[derive(Serialize)]
struct LaunchRow<'a> {
    product_id: &'a str,
    name: &'a str,
    launch_at: String,
    live: bool,
}

/// Run the launches command.
pub async fn run(args: LaunchesArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store_config()?;
    let schedule = store.launch_schedule();
    let now = Utc::now();

    let rows: Vec<LaunchRow<'_>> = schedule
        .launches()
        .iter()
        .map(|launch| LaunchRow {
            product_id: launch.product_id.as_str(),
            name: &launch.name,
            launch_at: launch.launch_at.to_rfc3339(),
            live: launch.launch_at <= now,
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&rows);
    } else if rows.is_empty() {
        ctx.output.info("No launches scheduled");
    } else {
        ctx.output.header("Launches");
        let widths = [14, 28, 26, 8];
        ctx.output
            .table_row(&["PRODUCT", "NAME", "LAUNCH AT", "STATUS"], &widths);
        for row in &rows {
            let status = if row.live { "live" } else { "upcoming" };
            ctx.output
                .table_row(&[row.product_id, row.name, &row.launch_at, status], &widths);
        }
    }

    if !args.watch {
        return Ok(());
    }
    let Some(next) = schedule.next_after(now) else {
        ctx.output.info("Nothing left to watch");
        return Ok(());
    };
    ctx.output.info(&format!(
        "Watching; next is {} at {} (Ctrl-C to stop)",
        next.name,
        next.launch_at.to_rfc3339()
    ));

    let watcher = LaunchWatcher::spawn(schedule.clone(), store.launch_interval());
    let mut rx = watcher.subscribe();
    let mut announced = rx.borrow_and_update().len();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let live = rx.borrow_and_update().clone();
                for launch in live.iter().skip(announced) {
                    ctx.output.success(&format!("{} is live", launch.name));
                    if ctx.output.is_json() {
                        ctx.output.json(launch);
                    }
                }
                announced = live.len();
                if schedule.next_after(Utc::now()).is_none() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.shutdown().await;
    Ok(())
}
