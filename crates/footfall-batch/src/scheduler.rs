//! "Daily at 02:00 local" scheduling without a cron dependency — the
//! pack carries no cron-scheduling crate, so this computes the next
//! occurrence with `chrono` and sleeps to it with
//! `tokio::time::sleep_until`, the same two crates the teacher already
//! uses for time arithmetic elsewhere.

use std::time::Duration;

use chrono::{Local, NaiveTime, TimeZone};
use footfall_chain::ChainGateway;

use crate::run::run_batch;

/// Runs forever, invoking [`run_batch`] once a day at `hour:minute`
/// local time. Manual triggers (the REST projection) call `run_batch`
/// directly — this loop is the only thing that calls it on a timer.
pub async fn run_daily_scheduler(
    pool: sqlx::AnyPool,
    chain: Option<&ChainGateway>,
    hour: u32,
    minute: u32,
    chain_deadline: Duration,
) {
    loop {
        let sleep_for = duration_until_next(hour, minute);
        tracing::info!(hours = sleep_for.as_secs() / 3600, "batch scheduler: sleeping until next run");
        tokio::time::sleep(sleep_for).await;

        tracing::info!("batch scheduler: running scheduled batch");
        match run_batch(&pool, chain, chain_deadline).await {
            Ok(summary) => tracing::info!(
                success = summary.success_count(),
                failure = summary.failure_count(),
                "batch scheduler: run complete"
            ),
            Err(e) => tracing::error!(error = %e, "batch scheduler: run failed"),
        }
    }
}

/// Wall-clock duration from now until the next `hour:minute` local time
/// (today if still ahead, otherwise tomorrow).
fn duration_until_next(hour: u32, minute: u32) -> Duration {
    let now = Local::now();
    let target_time = NaiveTime::from_hms_opt(hour, minute, 0).expect("valid hour/minute");
    let mut target = now.date_naive().and_time(target_time);
    if target <= now.naive_local() {
        target += chrono::Duration::days(1);
    }
    let target_local = Local.from_local_datetime(&target).single().unwrap_or(now);
    (target_local - now).to_std().unwrap_or(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_until_next_is_never_negative() {
        let d = duration_until_next(2, 0);
        assert!(d.as_secs() > 0);
        assert!(d.as_secs() <= 24 * 3600);
    }
}
