// CLI entry point: recalculates a saved form snapshot and prints the
// updated snapshot as JSON. Quiet mode by default (fills gaps only),
// --force to overwrite stale values.

use engine::calc::CalcEngine;
use engine::config::CalcSettings;
use engine::data::form::{FormFields, FormSnapshot};
use engine::data::normalizer;
use engine::error::EngineError;
use engine::events::TracingObserver;
use shared::models::RecomputeMode;
use tracing::info;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let path = args
        .iter()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .ok_or_else(|| {
            EngineError::ConfigError("usage: engine <snapshot.json> [--force]".to_string())
        })?;
    let mode = if args.iter().any(|a| a == "--force") {
        RecomputeMode::Forced
    } else {
        RecomputeMode::Quiet
    };

    let snapshot = FormSnapshot::load(path)?;
    let method = normalizer::normalize_payment_method(&snapshot.payment_method);
    info!(path = %path, method = ?method, mode = ?mode, "loaded form snapshot");

    let mut fields = FormFields::from_snapshot(&snapshot);
    let engine = CalcEngine::new(CalcSettings::default());
    engine.subscribe(Box::new(TracingObserver));

    // the auto-calculate toggle only gates background (quiet) passes
    if mode == RecomputeMode::Quiet && !snapshot.auto_calculate {
        info!("auto-calculate is disabled, leaving the form untouched");
    } else {
        let last_edited = fields.last_edited;
        let ctx = engine.read_context(&mut fields, method, last_edited);
        let changes = engine.recompute(&ctx, mode);
        info!(writes = changes.len(), "recompute finished");
        engine.apply_changes(&mut fields, &changes);
    }

    let updated = fields.to_snapshot(&snapshot.payment_method, snapshot.auto_calculate);
    println!("{}", serde_json::to_string_pretty(&updated)?);
    Ok(())
}
