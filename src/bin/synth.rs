//! logtally synthetic load driver
//!
//! Feeds generated access-log records into an engine and prints the top
//! rows of a few reports. Useful for eyeballing retention and cache rebuilds.

use clap::Parser;
use logtally::{Config, Counter, Engine, Module, RawValue, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

/// logtally synthetic load
#[derive(Parser, Debug)]
#[command(name = "logtally-synth")]
#[command(about = "Drive the logtally store with synthetic access-log records")]
#[command(version)]
struct Args {
    /// Number of consecutive days to generate (January)
    #[arg(short, long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=28))]
    days: u32,

    /// Records generated per day
    #[arg(short, long, default_value = "10000")]
    lines_per_day: u32,

    /// Keep only this many most recent days
    #[arg(short, long)]
    keep_last: Option<usize>,

    /// Rows printed per report
    #[arg(short, long, default_value = "5")]
    top: usize,

    /// Generator seed
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

const PATHS: &[&str] = &[
    "/", "/index.html", "/about", "/blog", "/blog/rust", "/api/v1/items", "/login", "/favicon.ico",
];
const METHODS: &[&str] = &["GET", "GET", "GET", "POST", "HEAD"];
const AGENTS: &[(&str, &str, &str)] = &[
    ("Mozilla/5.0 (Windows NT 10.0)", "Windows", "Windows 10"),
    ("Mozilla/5.0 (X11; Ubuntu; Linux)", "Linux", "Ubuntu 10.10"),
    ("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15)", "Macintosh", "macOS 10.15"),
    ("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)", "iOS", "iOS 17"),
];

struct Record<'a> {
    ip: String,
    path: &'a str,
    method: &'a str,
    agent: (&'a str, &'a str, &'a str),
    bytes: u64,
    micros: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logtally=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("logtally synth v{}", logtally::VERSION);

    let mut builder = Config::builder();
    if let Some(days) = args.keep_last {
        builder = builder.keep_last(days);
    }

    let mut engine = match Engine::open(builder.build()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut engine, &args) {
        tracing::error!("Synthetic load failed: {}", e);
        std::process::exit(1);
    }

    engine.free_all();
}

fn run(engine: &mut Engine, args: &Args) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);

    for day in 1..=args.days {
        let date = 2024_01_00 + day;
        for _ in 0..args.lines_per_day {
            let record = Record {
                ip: format!("10.0.{}.{}", rng.gen_range(0..4), rng.gen_range(0..64)),
                path: pick(&mut rng, PATHS),
                method: pick(&mut rng, METHODS),
                agent: pick(&mut rng, AGENTS),
                bytes: rng.gen_range(200..50_200),
                micros: rng.gen_range(100..250_100),
            };
            ingest(engine, date, &record)?;
        }
        tracing::info!(date, dates = engine.size_dates(), "day ingested");
    }

    for module in [Module::Visitors, Module::Requests, Module::Hosts, Module::Os] {
        engine.invalidate_raw_data(module);
        report(engine, module, args.top)?;
    }

    tracing::info!(
        dates = ?engine.sorted_dates(),
        valid = engine.sum_valid(),
        bytes = engine.sum_bw(),
        processed = engine.get_overall(Counter::Processed).unwrap_or(0),
        "totals"
    );
    if let Some((min, max)) = engine.get_bw_min_max(Module::Requests) {
        tracing::info!(min, max, "request bandwidth per day");
    }
    Ok(())
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn ingest(engine: &mut Engine, date: u32, record: &Record<'_>) -> Result<()> {
    let (agent, os_root, os) = record.agent;
    let identity = format!("{}|{}|{}", record.ip, date, agent);
    let uniq = engine.insert_unique_key(date, &identity)?.key;

    let agent_key = engine.insert_agent_key(agent)?.key;
    engine.insert_agent_value(agent_key, agent)?;

    // one row per date
    let day = date.to_string();
    let visit = engine.insert_keymap(Module::Visitors, date, &day)?;
    engine.insert_datamap(Module::Visitors, date, visit.key, &day, visit.ckey)?;
    engine.insert_hits(Module::Visitors, date, visit.key, 1, visit.ckey)?;
    engine.insert_visitor(Module::Visitors, date, visit.key, uniq, visit.ckey)?;

    let req = engine.insert_keymap(Module::Requests, date, record.path)?;
    engine.insert_datamap(Module::Requests, date, req.key, record.path, req.ckey)?;
    engine.insert_method(Module::Requests, date, req.key, record.method, req.ckey)?;
    engine.insert_protocol(Module::Requests, date, req.key, "HTTP/1.1", req.ckey)?;
    engine.insert_hits(Module::Requests, date, req.key, 1, req.ckey)?;
    engine.insert_visitor(Module::Requests, date, req.key, uniq, req.ckey)?;
    engine.insert_bw(Module::Requests, date, req.key, record.bytes, req.ckey)?;
    engine.insert_cumts(Module::Requests, date, req.key, record.micros, req.ckey)?;
    engine.insert_maxts(Module::Requests, date, req.key, record.micros, req.ckey)?;

    let host = engine.insert_keymap(Module::Hosts, date, &record.ip)?;
    engine.insert_datamap(Module::Hosts, date, host.key, &record.ip, host.ckey)?;
    engine.insert_hits(Module::Hosts, date, host.key, 1, host.ckey)?;
    engine.insert_agent(Module::Hosts, date, host.key, agent_key, host.ckey)?;

    let root = engine.insert_keymap(Module::Os, date, os_root)?;
    let leaf = engine.insert_keymap(Module::Os, date, os)?;
    engine.insert_rootmap(Module::Os, date, root.key, os_root, root.ckey)?;
    engine.insert_datamap(Module::Os, date, leaf.key, os, leaf.ckey)?;
    engine.insert_root(Module::Os, date, leaf.key, root.key, leaf.ckey, root.ckey)?;
    engine.insert_hits(Module::Os, date, leaf.key, 1, leaf.ckey)?;

    engine.inc_cnt_valid(date, 1)?;
    engine.inc_cnt_bw(date, record.bytes)?;
    engine.inc_overall(Counter::Processed, 1)?;
    Ok(())
}

fn report(engine: &mut Engine, module: Module, top: usize) -> Result<()> {
    let rows: Vec<(u32, RawValue)> = engine
        .raw_data(module)?
        .iter()
        .take(top)
        .map(|item| (item.key, item.value.clone()))
        .collect();

    for (ckey, value) in rows {
        let label = engine.get_datamap(module, ckey).unwrap_or("-");
        let hits = engine.get_hits(module, ckey).unwrap_or(0);
        let visitors = engine.get_visitors(module, ckey).unwrap_or(0);
        tracing::info!(
            module = %module,
            ckey,
            label,
            hits,
            visitors,
            value = ?value,
            root = engine.get_root(module, ckey).unwrap_or("-"),
            "top row"
        );
    }
    Ok(())
}
