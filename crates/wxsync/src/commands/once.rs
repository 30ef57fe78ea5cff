//! `wxsync once`: bootstrap plus a single pass, for cron-style use.

use crate::cli::{GlobalOpts, OnceArgs};
use crate::error::CliError;

pub async fn handle(args: &OnceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (mut engine, mode) = super::start(global).await?;
    let report = engine.run_tick().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("bootstrap:     {mode:?}");
    println!("checked:       {}", report.checked);
    println!("written:       {}", report.written);
    println!("failed writes: {}", report.failed_writes);
    if !report.unmatched.is_empty() {
        println!("unmatched:     {}", report.unmatched.join(", "));
    }
    if report.station_renamed {
        if let Some(name) = engine.station_name() {
            println!("station:       {name}");
        }
    }
    Ok(())
}
