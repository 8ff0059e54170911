use crate::{cli, enrich::UsageLedger, error, info, warning};

/// Shows the analysis API usage for the current month.
pub async fn usage() {
    let cfg = cli::load_config();
    let (_, usage_store) = cli::open_stores(&cfg);
    let ledger = UsageLedger::new(usage_store, &cfg.provider);

    let record = match ledger.read().await {
        Ok(record) => record,
        Err(e) => error!("Cannot read usage ledger: {}", e),
    };

    let remaining = cfg.monthly_limit.saturating_sub(record.calls_made);
    info!("Provider: {}", cfg.provider);
    info!("Month: {}", record.month);
    info!("Calls made: {}", record.calls_made);
    info!("Monthly limit: {}", cfg.monthly_limit);
    info!("Remaining: {}", remaining);

    if !UsageLedger::has_quota(&record, cfg.monthly_limit) {
        warning!("Monthly limit reached. Only cached tracks are available until next month.");
    }
}
