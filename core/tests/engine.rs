//! End-to-end engine tests: CSV exports in, per-domain reports out.

use queuepulse_core::{
    config::AnalysisConfig,
    engine::{AnalysisEngine, AnalysisInputs, RunReport},
    error::AnalysisError,
    ingest::{read_queue_performance, read_timeline},
    report::{write_occupancy, write_report},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const TIMELINE: &str = "\
Nombre del agente;Nombre de la división;Estado principal;Hora de inicio;Hora de finalización
AG0401 ANA;Supervisor_MA;En la cola;19/10/25 07:54:42;19/10/25 09:10:00
AG0402 RAUL;Supervisor_MA;En la cola;19/10/25 08:10:00;
AG0402 RAUL;Supervisor_MA;En la cola;19/10/25 08:40:00;19/10/25 09:00:00
AG0402 RAUL;Supervisor_MA;Disponible;19/10/25 09:00:00;19/10/25 12:00:00
AG0301 LUIS;Supervisor_MA;En la cola;19/10/25 08:00:00;19/10/25 10:00:00
AG0101 MARTA;Fraude;En la cola;19/10/25 08:00:00;19/10/25 08:20:00
AG0102 JOSE;Fraude;Disponible;19/10/25 08:00:00;19/10/25 09:00:00
";

const QUEUES: &str = "\
Nombre de cola;Inicio del intervalo;Fin del intervalo;Oferta;Contestadas;Abandonadas;Cumplen el SLA;Retener;Manejo total;Manejo medio
MA_Credito;19/10/25 08:00;19/10/25 08:30;10;8;2;6;;40m 0s;5m 0s
MA_Debito;19/10/25 08:00;19/10/25 08:30;10;9;1;8;;30m 0s;3m 0s
MA_Credito;19/10/25 08:30;19/10/25 09:00;0;0;0;0;;;
MA_Debito;19/10/25 09:00;19/10/25 09:30;10;9;1;0;;;
\"MA_Credito;MA_Debito\";19/10/25 08:00;19/10/25 08:30;100;100;0;100;;;
MA_Credito;20/10/25 08:00;20/10/25 08:30;50;50;0;50;;;
Fraude;19/10/25 08:00;19/10/25 08:30;4;4;0;4;2;10m 0s;2m 30s
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn inputs(timeline: &str, queues: &str) -> AnalysisInputs {
    AnalysisInputs {
        timeline:        read_timeline(timeline.as_bytes()).expect("timeline"),
        queue_rows:      read_queue_performance(queues.as_bytes()).expect("queues"),
        timeline_source: "timeline.csv".into(),
    }
}

fn run() -> RunReport {
    init_logging();
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).expect("engine");
    engine.run(&inputs(TIMELINE, QUEUES), None).expect("run")
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Division filter and exclusions pick ANA and RAUL for the help desk.
#[test]
fn help_desk_occupancy_from_division_roster() {
    let report = run();
    assert_eq!(report.date.to_string(), "2025-10-19");

    let help = &report.domains[0];
    assert_eq!(help.domain, "help_desk");
    assert_eq!(help.agents, 2, "LUIS is excluded, JOSE/MARTA are in another division");

    let occ = &help.occupancy;
    assert_eq!(occ.count_for("07:30-08:00"), 1);
    assert_eq!(occ.count_for("08:00-08:30"), 2);
    assert_eq!(occ.count_for("08:30-09:00"), 2);
    assert_eq!(occ.count_for("09:00-09:30"), 1);
    assert_eq!(occ.count_for("09:30-10:00"), 0);
    assert_eq!(occ.active_buckets(), 4);
}

/// Not-in-queue states never count, even for roster members.
#[test]
fn fraud_occupancy_ignores_other_states() {
    let report = run();
    let fraud = &report.domains[1];
    assert_eq!(fraud.domain, "fraud");
    assert_eq!(fraud.agents, 1);
    assert_eq!(fraud.occupancy.count_for("08:00-08:30"), 1);
    assert_eq!(fraud.occupancy.active_buckets(), 1);
    assert_eq!(fraud.unmatched_members, vec!["AG0102".to_string()]);
}

/// Queue rows are summed per bucket and joined with connected agents.
#[test]
fn help_desk_interval_metrics() {
    let report = run();
    let rows = &report.domains[0].intervals;
    let labels: Vec<&str> = rows.iter().map(|r| r.interval.as_str()).collect();
    assert_eq!(labels, vec!["08:00-08:30", "08:30-09:00", "09:00-09:30"]);

    let first = &rows[0];
    assert_eq!((first.offered, first.answered, first.abandoned, first.within_sla), (20, 17, 3, 14));
    assert_eq!(first.answer_rate_pct, 85.0);
    assert_eq!(first.service_level_pct, 70.0);
    assert_eq!(first.abandon_rate_pct, 15.0);
    // 4200 s over 18 handled calls
    assert_eq!(first.aht, "00:03:53");
    assert_eq!(first.aht_seconds, 233.0);
    assert_eq!(first.connected_agents, 2);
    assert_eq!(first.calls_per_agent, 8.5);

    let empty = &rows[1];
    assert_eq!(empty.offered, 0);
    assert_eq!(empty.service_level_pct, 0.0);
    assert_eq!(empty.calls_per_agent, 0.0);
    assert_eq!(empty.aht, "00:00:00");

    // SL 0% with 90% answered: the help desk reports answer rate instead.
    let fallback = &rows[2];
    assert_eq!(fallback.service_level_pct, 90.0);
    assert_eq!(fallback.connected_agents, 1);
}

#[test]
fn fraud_interval_metrics_include_retention() {
    let report = run();
    let rows = &report.domains[1].intervals;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].retained, 2);
    assert_eq!(rows[0].retention_pct, 50.0);
    assert_eq!(rows[0].aht, "00:02:30");
    assert_eq!(rows[0].calls_per_agent, 4.0);
}

/// Calls per agent divides answered calls, not offered ones.
#[test]
fn calls_per_agent_counts_answered_calls() {
    init_logging();
    let queues = "\
Nombre de cola;Inicio del intervalo;Fin del intervalo;Oferta;Contestadas;Abandonadas;Cumplen el SLA
MA_Credito;19/10/25 08:00;19/10/25 08:30;10;4;6;4
";
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let report = engine
        .run_selected(&inputs(TIMELINE, queues), None, Some("help_desk"))
        .unwrap();
    let row = &report.domains[0].intervals[0];
    assert_eq!(row.connected_agents, 2);
    assert_eq!(row.offered, 10);
    assert_eq!(row.calls_per_agent, 2.0);
}

/// Outbound queues report their volume through `Contactando`.
#[test]
fn outbound_contacts_are_summed_per_interval() {
    init_logging();
    let queues = "\
Nombre de cola;Inicio del intervalo;Fin del intervalo;Oferta;Contestadas;Abandonadas;Cumplen el SLA;Contactando;Manejo total;Manejo medio
Fraude;19/10/25 08:00;19/10/25 08:30;0;0;0;0;7;700;100
Fraude_MA;19/10/25 08:00;19/10/25 08:30;0;0;0;0;3;;
";
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let report = engine
        .run_selected(&inputs(TIMELINE, queues), None, Some("fraud"))
        .unwrap();
    let row = &report.domains[0].intervals[0];
    assert_eq!(row.outbound_calls, 10);
    assert_eq!(row.offered, 0);
    assert_eq!(row.aht, "00:01:40");
}

/// Dropped records are reported on the domain that owns the agent.
#[test]
fn dropped_records_are_counted_per_domain() {
    let timeline = format!(
        "{TIMELINE}AG0401 ANA;Supervisor_MA;En la cola;19/10/25 11:00:00;19/10/25 10:00:00\n\
         AG0402 RAUL;Supervisor_MA;En la cola;garbage;\n"
    );
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let report = engine.run(&inputs(&timeline, QUEUES), None).unwrap();
    assert_eq!(report.domains[0].dropped_records, 2);
    assert_eq!(report.domains[1].dropped_records, 0);
    assert_eq!(report.stats.inverted, 1);
    assert_eq!(report.stats.malformed, 1);
}

/// Domains without the fallback flag keep the raw service level.
#[test]
fn service_level_fallback_is_per_domain() {
    init_logging();
    let queues = "\
Nombre de cola;Inicio del intervalo;Fin del intervalo;Oferta;Contestadas;Abandonadas;Cumplen el SLA
Fraude;19/10/25 10:00;19/10/25 10:30;10;9;1;0
";
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let report = engine
        .run_selected(&inputs(TIMELINE, queues), None, Some("fraud"))
        .unwrap();
    assert_eq!(report.domains.len(), 1);
    assert_eq!(report.domains[0].intervals[0].service_level_pct, 0.0);
}

/// Every in-queue record is accounted for in the run stats.
#[test]
fn run_stats_count_resolutions() {
    let report = run();
    assert_eq!(report.stats.recorded, 4);
    assert_eq!(report.stats.next_start, 1);
    assert_eq!(report.stats.end_of_day, 0);
    assert_eq!(report.stats.malformed, 0);
}

/// A timeline without any parseable date aborts the run.
#[test]
fn undated_timeline_aborts_the_run() {
    init_logging();
    let timeline = "\
Nombre del agente;Estado principal;Hora de inicio;Hora de finalización
AG0101;En la cola;;
AG0102;En la cola;yesterday;
";
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    match engine.run(&inputs(timeline, QUEUES), None) {
        Err(AnalysisError::NoDateDetected { source_name }) => assert_eq!(source_name, "timeline.csv"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("an undated timeline must not produce a report"),
    }
}

/// The interval-start column wins over record starts for date detection.
#[test]
fn interval_column_drives_date_detection() {
    let timeline = "\
Nombre del agente;Estado principal;Hora de inicio;Hora de finalización;Inicio del intervalo
AG0101;En la cola;18/10/25 23:50:00;19/10/25 00:40:00;19/10/25 00:00
";
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let inputs = inputs(timeline, QUEUES);
    let date = engine.target_date(&inputs, None).unwrap();
    assert_eq!(date.to_string(), "2025-10-19");

    let report = engine.run_selected(&inputs, None, Some("fraud")).unwrap();
    assert_eq!(report.domains[0].occupancy.count_for("00:00-00:30"), 1);
}

#[test]
fn unknown_domain_is_rejected() {
    let engine = AnalysisEngine::new(AnalysisConfig::default_test()).unwrap();
    let err = engine
        .run_domain("billing", &inputs(TIMELINE, QUEUES), None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownDomain { .. }));
}

/// A roster that matches nobody yields zeros, not an error.
#[test]
fn empty_roster_gives_zero_occupancy() {
    let mut config = AnalysisConfig::default_test();
    config.domains[1].roster.members = vec!["AG9999".into()];
    let engine = AnalysisEngine::new(config).unwrap();
    let report = engine.run_domain("fraud", &inputs(TIMELINE, QUEUES), None).unwrap();
    assert_eq!(report.agents, 0);
    assert_eq!(report.occupancy.buckets.len(), 48);
    assert_eq!(report.occupancy.active_buckets(), 0);
    assert_eq!(report.intervals[0].connected_agents, 0);
    assert_eq!(report.intervals[0].calls_per_agent, 0.0);
}

#[test]
fn reports_are_written_as_csv() {
    let report = run();
    let help = &report.domains[0];

    let mut buf = Vec::new();
    write_report(&mut buf, &help.intervals).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert!(lines
        .next()
        .unwrap()
        .starts_with("Interval,Date,Offered,Answered,Abandoned,AnsweredWithinSla,Retained,OutboundCalls"));
    assert!(lines.next().unwrap().starts_with("08:00-08:30,2025-10-19,20,17,3,14,0,0,"));

    let mut buf = Vec::new();
    write_occupancy(&mut buf, &help.occupancy).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 49);
    assert!(text.contains("08:00-08:30,2\n"));
    assert!(text.ends_with("23:30-00:00,0\n"));
}
