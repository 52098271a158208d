//! queue-runner: headless interval analysis over the platform exports.
//!
//! Usage:
//!   queue-runner --timeline timeline.csv --queues queues.csv
//!   queue-runner --timeline timeline.csv --queues queues.csv \
//!       --config data/domains.json --out reports --date 19/10/2025 --domain fraud

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use queuepulse_core::{
    config::AnalysisConfig,
    engine::{AnalysisEngine, AnalysisInputs, DomainReport, RunReport},
    ingest::{read_queue_performance_file, read_timeline_file},
    report::{write_occupancy_file, write_report_file},
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let timeline = find_arg(&args, "--timeline")
        .ok_or_else(|| anyhow!("--timeline <csv> is required"))?;
    let queues = find_arg(&args, "--queues")
        .ok_or_else(|| anyhow!("--queues <csv> is required"))?;
    let config_path = find_arg(&args, "--config").unwrap_or("./data/domains.json");
    let out_dir = PathBuf::from(find_arg(&args, "--out").unwrap_or("./reports"));
    let only_domain = find_arg(&args, "--domain");
    let date_override = find_arg(&args, "--date")
        .map(|d| {
            NaiveDate::parse_from_str(d, "%d/%m/%Y")
                .with_context(|| format!("--date must be dd/mm/yyyy, got '{d}'"))
        })
        .transpose()?;

    println!("queue-runner");
    println!("  timeline:  {timeline}");
    println!("  queues:    {queues}");
    println!("  config:    {config_path}");
    println!("  out:       {}", out_dir.display());
    if let Some(date) = date_override {
        println!("  date:      {date} (override)");
    }
    println!();

    let config = AnalysisConfig::load(config_path)?;
    let engine = AnalysisEngine::new(config)?;

    let inputs = AnalysisInputs {
        timeline:        read_timeline_file(Path::new(timeline))?,
        queue_rows:      read_queue_performance_file(Path::new(queues))?,
        timeline_source: timeline.to_string(),
    };

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Cannot create {}", out_dir.display()))?;

    let report = engine
        .run_selected(&inputs, date_override, only_domain)
        .context("Analysis aborted")?;

    for domain in &report.domains {
        write_domain(&engine, domain, &out_dir)?;
    }

    print_summary(&report);
    Ok(())
}

fn write_domain(engine: &AnalysisEngine, domain: &DomainReport, out_dir: &Path) -> Result<()> {
    let config = engine.config().domain(&domain.domain)?;
    write_report_file(&out_dir.join(&config.output_file), &domain.intervals)?;
    write_occupancy_file(
        &out_dir.join(format!("{}_occupancy.csv", domain.domain)),
        &domain.occupancy,
    )?;
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("=== RUN SUMMARY ===");
    println!("  date:             {}", report.date.format("%d/%m/%Y"));
    println!("  recorded ends:    {}", report.stats.recorded);
    println!("  same-start ends:  {}", report.stats.same_start_peer);
    println!("  next-start ends:  {}", report.stats.next_start);
    println!("  end-of-day ends:  {}", report.stats.end_of_day);
    println!("  dropped:          {} malformed, {} inverted", report.stats.malformed, report.stats.inverted);
    println!();
    println!("=== DOMAINS ===");
    for d in &report.domains {
        let offered: u64 = d.intervals.iter().map(|i| i.offered).sum();
        let peak = d
            .occupancy
            .peak()
            .map(|b| format!("{} agents at {}", b.agents, b.label))
            .unwrap_or_else(|| "no agents".to_string());
        println!(
            "  {:<24} | agents: {:>3} | intervals: {:>2} | offered: {:>5} | peak: {}",
            d.label,
            d.agents,
            d.intervals.len(),
            offered,
            peak
        );
        if d.dropped_records > 0 {
            println!("  {:<24} | {} records dropped (see log)", "", d.dropped_records);
        }
        if d.roster_ambiguities > 0 {
            println!("  {:<24} | {} ambiguous roster matches (see log)", "", d.roster_ambiguities);
        }
    }
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
