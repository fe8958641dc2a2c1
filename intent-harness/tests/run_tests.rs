mod common;

use common::{intent_of, write_csv, MockServer, Reply};
use intent_harness::loader::{load_records, parse_records, LoaderOptions};
use intent_harness::strategy::FailureKind;
use intent_harness::{
    strategy_for, DispatchOutcome, HarnessConfig, HarnessRunner, HttpDispatcher, IntentEndpoint,
    Prediction, ValidationMode,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::time::Duration;

/// Answers from a closure and remembers what it was asked.
struct ScriptedEndpoint<F> {
    respond: F,
    asked: RefCell<Vec<String>>,
}

impl<F: Fn(&str) -> DispatchOutcome> ScriptedEndpoint<F> {
    fn new(respond: F) -> Self {
        Self {
            respond,
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl<F: Fn(&str) -> DispatchOutcome> IntentEndpoint for ScriptedEndpoint<F> {
    fn classify(&self, intent: &str) -> DispatchOutcome {
        self.asked.borrow_mut().push(intent.to_string());
        (self.respond)(intent)
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

const LOOSE_CSV: &str = "service_id;service_name;intent\n\
                         1;Boleto;segunda via\n\
                         2;Cartao;desbloquear\n\
                         x;Broken;ignored\n\
                         3;Saldo;\n\
                         4;Pix;fazer um pix\n\
                         5;Limite;aumentar limite\n";

#[test]
fn loose_run_counts_every_admitted_row_once() {
    let loaded = parse_records(LOOSE_CSV, &LoaderOptions::default()).unwrap();
    let endpoint = ScriptedEndpoint::new(|intent| match intent {
        "segunda via" => DispatchOutcome::from_body(200, r#"{"id": 1}"#, 3.0),
        "desbloquear" => DispatchOutcome::from_body(200, r#"{"result": {"service_id": 9}}"#, 3.0),
        "fazer um pix" => DispatchOutcome::Transport {
            error: "operation timed out".to_string(),
            timed_out: true,
            latency_ms: 5000.0,
        },
        _ => DispatchOutcome::from_body(200, "5 (limite)", 3.0),
    });

    let runner = HarnessRunner::new(&endpoint, strategy_for(ValidationMode::Loose));
    let mut printed = Vec::new();
    let report = runner.run(&loaded, |row| printed.push(row.line_number));

    // one printed line per admitted row, in file order
    assert_eq!(printed, vec![2, 3, 6, 7]);
    assert_eq!(
        *endpoint.asked.borrow(),
        vec!["segunda via", "desbloquear", "fazer um pix", "aumentar limite"]
    );

    let summary = &report.summary;
    assert_eq!(summary.total, 4);
    assert_eq!(summary.correct, 2);
    assert_eq!(summary.correct + summary.failed(), summary.total);
    assert_eq!(summary.accuracy(), Some(50.0));
    assert_eq!(summary.skipped_empty_intent, 1);
    assert!(summary.is_success());

    let pix = &report.rows[2];
    assert_eq!(pix.result.prediction, Prediction::TransportFailure);
    assert_eq!(pix.predicted(), -1);
    assert_eq!(summary.pair_count(4, -1), 1);
    assert_eq!(summary.pair_count(2, 9), 1);

    let top = summary.top_mismatches(30);
    assert_eq!(top.len(), 2);
}

#[test]
fn strict_run_fails_on_any_bad_row() {
    let csv = "intent,id,service_name\n\
               desbloquear cartão,9,Desbloqueio de Cartão\n\
               segunda via,1,Boleto\n\
               ,3,Vazio\n";
    let options = HarnessConfig {
        mode: ValidationMode::Strict,
        ..HarnessConfig::default()
    }
    .loader_options()
    .unwrap();
    let loaded = parse_records(csv, &options).unwrap();
    assert_eq!(loaded.records.len(), 2);

    let endpoint = ScriptedEndpoint::new(|intent| match intent {
        "desbloquear cartão" => DispatchOutcome::from_body(
            200,
            r#"{"success": true, "data": {"service_id": "9", "service_name": "desbloqueio de cartão"}}"#,
            4.0,
        ),
        _ => DispatchOutcome::from_body(200, r#"{"success": false, "error": "no match"}"#, 4.0),
    });

    let report = HarnessRunner::new(&endpoint, strategy_for(ValidationMode::Strict))
        .run(&loaded, |_| {});
    let summary = &report.summary;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.correct, 1);
    assert_eq!(summary.skipped_empty_intent, 1);
    assert_eq!(summary.failures_by_kind.get(&FailureKind::Validation), Some(&1));
    assert_eq!(summary.failures_by_service.get("Boleto"), Some(&1));
    assert!(report.rows[1].reason.as_deref().unwrap().contains("success"));
    assert!(!summary.is_success());
}

#[test]
fn zero_valid_rows_yields_no_accuracy() {
    let loaded = parse_records("service_id;intent\nabc;x\n", &LoaderOptions::default()).unwrap();
    let endpoint = ScriptedEndpoint::new(|_| panic!("no request expected"));
    let report = HarnessRunner::new(&endpoint, strategy_for(ValidationMode::Loose))
        .run(&loaded, |_| {});
    assert_eq!(report.summary.total, 0);
    assert_eq!(report.summary.accuracy(), None);
}

#[test]
fn timeout_on_one_row_does_not_stop_the_run() {
    let server = MockServer::start(|request| match intent_of(request).as_str() {
        "slow" => Reply::stall(Duration::from_secs(2)),
        "plain" => Reply::ok("12"),
        _ => Reply::ok(r#"{"data": {"id": 13}}"#),
    });
    let (_dir, path) = write_csv(
        "service_id;service_name;intent\n\
         11;A;slow\n\
         12;B;plain\n\
         13;C;nested\n",
    );

    let loaded = load_records(&path, &LoaderOptions::default()).unwrap();
    let dispatcher =
        HttpDispatcher::new(server.url("/api/find-service"), Duration::from_millis(300)).unwrap();
    let report = HarnessRunner::new(&dispatcher, strategy_for(ValidationMode::Loose))
        .run(&loaded, |_| {});

    let predicted: Vec<i64> = report.rows.iter().map(|r| r.predicted()).collect();
    assert_eq!(predicted, vec![-1, 12, 13]);
    assert_eq!(report.rows[0].failure, Some(FailureKind::Timeout));
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.correct, 2);
}
