//! promo-runner: headless promotion evaluator.
//!
//! Usage:
//!   promo-runner --deposits dep.csv --wagers jug.csv --out bonificables.csv
//!   promo-runner --deposits dep.csv --wagers jug.csv --config data/promotion.json --db runs.db
//!   promo-runner --deposits dep.csv --wagers jug.csv --ipc-mode

use anyhow::{bail, Result};
use promo_core::{
    config::{AggregationMode, PromotionConfig},
    dataset::Dataset,
    engine::{PromotionEngine, PromotionRun},
    export, ingest,
    store::{new_run_id, PromoStore},
    table::{PromotionSummary, PromotionTable},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    /// Fields present in `config` replace the session's; absent ones keep
    /// their current value (including CLI overrides).
    Evaluate { config: serde_json::Value },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    run_id:  Option<&'a str>,
    config:  &'a PromotionConfig,
    columns: Vec<String>,
    summary: Option<PromotionSummary>,
    table:   Option<&'a PromotionTable>,
}

/// Everything the IPC loop keeps between commands: the loaded inputs and
/// the last successful evaluation.
struct Session {
    deposits: Dataset,
    wagering: Dataset,
    config:   PromotionConfig,
    store:    Option<PromoStore>,
    last:     Option<(String, PromotionTable)>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let (Some(deposits_path), Some(wagers_path)) =
        (str_arg(&args, "--deposits"), str_arg(&args, "--wagers"))
    else {
        bail!("usage: promo-runner --deposits <csv> --wagers <csv> [options]");
    };

    let config = build_config(&args)?;
    let deposits = ingest::load_csv(deposits_path)?;
    let wagering = ingest::load_csv(wagers_path)?;

    let store = match str_arg(&args, "--db") {
        Some(db) => {
            let store = PromoStore::open(db)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    if !ipc_mode {
        println!("Casino promotions — promo-runner");
        println!("  deposits:  {deposits_path} ({} rows)", deposits.len());
        println!("  wagering:  {wagers_path} ({} rows)", wagering.len());
        println!("  mode:      {}", config.aggregation_mode.name());
        println!("  rollover:  {}", config.rollover_enabled);
        println!();
    }

    let mut session = Session {
        deposits,
        wagering,
        config,
        store,
        last: None,
    };

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        let run_id = session.evaluate()?;
        if let Some((_, table)) = &session.last {
            if let Some(path) = str_arg(&args, "--out") {
                export::write_csv(table, path)?;
                println!("  wrote {path}");
            }
            if let Some(path) = str_arg(&args, "--json") {
                export::write_json(table, path)?;
                println!("  wrote {path}");
            }
            print_summary(&run_id, table);
        }
    }

    Ok(())
}

impl Session {
    /// Recompute from scratch with the current config; persist if a store is open.
    fn evaluate(&mut self) -> Result<String> {
        let engine = PromotionEngine::new(self.config.clone())?;
        let PromotionRun { table, events } = engine.run(&self.deposits, &self.wagering)?;

        let run_id = new_run_id();
        if let Some(store) = &self.store {
            store.record_run(&run_id, &self.config, env!("CARGO_PKG_VERSION"), &events, &table)?;
        }

        self.last = Some((run_id.clone(), table));
        Ok(run_id)
    }

    fn ui_state(&self) -> UiState<'_> {
        let last = self.last.as_ref();
        UiState {
            run_id:  last.map(|(id, _)| id.as_str()),
            config:  &self.config,
            columns: last.map(|(_, t)| t.column_names()).unwrap_or_default(),
            summary: last.map(|(_, t)| t.summary()),
            table:   last.map(|(_, t)| t),
        }
    }
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unrecognised IPC command: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&session.ui_state())?)?;
            }
            IpcCommand::Evaluate { config } => {
                let config = match overlay_config(&session.config, config) {
                    Ok(c) => c,
                    Err(e) => {
                        write_error(&mut stdout, &e.to_string())?;
                        continue;
                    }
                };
                let previous = std::mem::replace(&mut session.config, config);
                match session.evaluate() {
                    Ok(_) => {
                        writeln!(stdout, "{}", serde_json::to_string(&session.ui_state())?)?;
                    }
                    Err(e) => {
                        session.config = previous;
                        write_error(&mut stdout, &e.to_string())?;
                    }
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{}", err_json)?;
    out.flush()?;
    Ok(())
}

/// Start from `--config` (or defaults) and apply flag overrides on top.
fn build_config(args: &[String]) -> Result<PromotionConfig> {
    let mut config = match str_arg(args, "--config") {
        Some(path) => PromotionConfig::load(path)?,
        None => PromotionConfig::default(),
    };

    if let Some(col) = str_arg(args, "--deposit-user-col") {
        config.deposit_user_column = col.to_string();
    }
    if let Some(col) = str_arg(args, "--wager-user-col") {
        config.wager_user_column = col.to_string();
    }
    if let Some(mode) = str_arg(args, "--mode") {
        config.aggregation_mode = mode.parse::<AggregationMode>()?;
    }
    if let Some(v) = money_arg(args, "--deposit-min")? {
        config.deposit_min = v;
    }
    if let Some(v) = money_arg(args, "--wagered-min")? {
        config.wagered_min = v;
    }
    if let Some(v) = money_arg(args, "--bonus-percent")? {
        config.bonus_percent = v;
    }
    if let Some(v) = money_arg(args, "--bonus-cap")? {
        config.bonus_cap = v;
    }
    if args.iter().any(|a| a == "--rollover") {
        config.rollover_enabled = true;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(run_id: &str, table: &PromotionTable) {
    let s = table.summary();
    println!("=== PROMOTION SUMMARY ===");
    println!("  run_id:          {run_id}");
    println!("  users:           {}", s.user_count);
    println!("  eligible:        {}", s.eligible_count);
    println!("  bonus payable:   ${:.2}", s.total_bonus);
    if table.rollover_enabled {
        println!("  bonus pending:   ${:.2}", s.total_pending);
    }

    println!();
    let eligible: Vec<_> = table.rows.iter().filter(|r| r.eligible).take(10).collect();
    if eligible.is_empty() {
        println!("  (No eligible users)");
    } else {
        for r in eligible {
            println!(
                "  {} | Deposit: ${:.2} | Wagered: ${:.2} | Bonus: ${:.2}{}",
                r.user_id,
                r.deposit_amount,
                r.wagered_amount,
                r.bonus_amount,
                r.bonus_pending_rollover
                    .map(|p| format!(" | Pending: ${p:.2}"))
                    .unwrap_or_default()
            );
        }
    }
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// A numeric rule parameter. Absent → None; present but unparseable → error.
fn money_arg(args: &[String], flag: &str) -> Result<Option<f64>> {
    if args.last().is_some_and(|a| a == flag) {
        bail!("{flag} needs a value");
    }
    match str_arg(args, flag) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => bail!("{flag}: '{raw}' is not a number"),
        },
    }
}

/// Apply a (possibly partial) JSON config on top of `base`.
fn overlay_config(base: &PromotionConfig, patch: serde_json::Value) -> Result<PromotionConfig> {
    let serde_json::Value::Object(fields) = patch else {
        bail!("evaluate: config must be a JSON object");
    };
    let mut merged = serde_json::to_value(base)?;
    if let Some(obj) = merged.as_object_mut() {
        obj.extend(fields);
    }
    Ok(serde_json::from_value(merged)?)
}
