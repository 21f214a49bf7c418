use std::path::Path;

use arlo_app::cli::{Command, SheetKind};
use arlo_app::commands;
use arlo_app::config::AppConfig;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    arlo_logging::initialize_for_tests();
}

fn config_for(server: &MockServer, output_dir: &Path) -> AppConfig {
    AppConfig {
        base_url: server.uri(),
        election_id: Some("e1".to_string()),
        poll_timeout_ms: 2_000,
        poll_interval_ms: 10,
        output_dir: output_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

fn status(sample_size: Option<u64>) -> Value {
    json!({
        "name": "General",
        "riskLimit": 10,
        "contests": [{"id": "c1", "name": "Mayor", "totalBallotsCast": 500}],
        "jurisdictions": [{"id": "j1", "name": "County North"}],
        "rounds": [{
            "id": "r1",
            "contests": [{
                "id": "c1",
                "sampleSizeOptions": [{"size": 120, "prob": 0.9}],
                "sampleSize": sample_size
            }]
        }]
    })
}

/// Starts a mock server that knows an audit admin with a status endpoint.
fn admin_server(rt: &Runtime) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"type": "audit_admin"})),
            )
            .mount(&server)
            .await;
        server
    })
}

fn run(command: Command, config: &AppConfig) -> anyhow::Result<String> {
    let mut out = Vec::new();
    commands::run(&command, config, None, &mut out)?;
    Ok(String::from_utf8(out).expect("utf8 output"))
}

#[test]
fn status_prints_single_jurisdiction_steps() {
    init_logging();
    let rt = Runtime::new().unwrap();
    let server = admin_server(&rt);
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(None)))
            .expect(1)
            .mount(&server),
    );
    let dir = TempDir::new().unwrap();

    let text = run(Command::Status, &config_for(&server, dir.path())).unwrap();

    assert!(text.starts_with("Audit: General  rounds: 1\n"), "{text}");
    assert!(text.contains("  Select ballots to audit: ready\n"), "{text}");
    assert!(text.contains("  Calculate risk measurement: pending\n"), "{text}");
    assert!(!text.contains("Loading..."), "{text}");
}

#[test]
fn sample_size_waits_until_the_server_draws_it() {
    init_logging();
    let rt = Runtime::new().unwrap();
    let server = admin_server(&rt);
    rt.block_on(async {
        // Mount and the refresh after submitting still see no sample size.
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(None)))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(Some(120))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/election/e1/audit/sample-size"))
            .and(body_json(json!({"size": 120})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
    });
    let dir = TempDir::new().unwrap();

    let text = run(
        Command::SampleSize {
            value: "120".to_string(),
        },
        &config_for(&server, dir.path()),
    )
    .unwrap();

    assert!(text.contains("  Calculate risk measurement: ready\n"), "{text}");
    assert!(text.contains("Sample size: 120\n"), "{text}");
    assert!(!text.contains("! "), "{text}");
}

#[test]
fn invalid_sample_size_is_refused_without_a_request() {
    init_logging();
    let rt = Runtime::new().unwrap();
    let server = admin_server(&rt);
    rt.block_on(async {
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(None)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/election/e1/audit/sample-size"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    });
    let dir = TempDir::new().unwrap();

    let err = run(
        Command::SampleSize {
            value: "600".to_string(),
        },
        &config_for(&server, dir.path()),
    )
    .unwrap_err();

    assert!(err.to_string().contains("Must be smaller than 500"), "{err}");
}

#[test]
fn missing_election_id_is_an_error() {
    let config = AppConfig::default();
    let mut out = Vec::new();
    let err = commands::run(&Command::Status, &config, None, &mut out).unwrap_err();
    assert!(err.to_string().contains("no election id"), "{err}");
    assert!(out.is_empty());
}

#[test]
fn labels_sheet_is_written_to_output_dir() {
    init_logging();
    let rt = Runtime::new().unwrap();
    let server = admin_server(&rt);
    rt.block_on(async {
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(Some(120))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/election/e1/jurisdiction/j1/round/r1/ballot-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ballots": [
                    {
                        "position": 3,
                        "batch": {"id": "b1", "name": "Batch One"},
                        "auditBoard": {"id": "ab1", "name": "Board #1"}
                    },
                    {
                        "position": 9,
                        "batch": {"id": "b1", "name": "Batch One"},
                        "auditBoard": {"id": "ab1", "name": "Board #1"}
                    }
                ]
            })))
            .mount(&server)
            .await;
    });
    let dir = TempDir::new().unwrap();

    let text = run(
        Command::Sheets {
            kind: SheetKind::Labels,
            jurisdiction: "j1".to_string(),
            round: "r1".to_string(),
            round_num: None,
            origin: None,
        },
        &config_for(&server, dir.path()),
    )
    .unwrap();

    let written = dir.path().join("Round 1 Labels - County North - General.json");
    assert_eq!(text, format!("Wrote {}\n", written.display()));
    let doc: Value = serde_json::from_slice(&std::fs::read(&written).unwrap()).unwrap();
    assert_eq!(doc["pages"].as_array().map(Vec::len), Some(1));
}

#[test]
fn empty_ballot_list_writes_nothing() {
    init_logging();
    let rt = Runtime::new().unwrap();
    let server = admin_server(&rt);
    rt.block_on(async {
        Mock::given(method("GET"))
            .and(path("/election/e1/audit/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status(None)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/election/e1/jurisdiction/j1/round/r1/ballot-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ballots": []})))
            .mount(&server)
            .await;
    });
    let dir = TempDir::new().unwrap();

    let text = run(
        Command::Sheets {
            kind: SheetKind::Placeholders,
            jurisdiction: "j1".to_string(),
            round: "r1".to_string(),
            round_num: Some(2),
            origin: None,
        },
        &config_for(&server, dir.path()),
    )
    .unwrap();

    assert_eq!(text, "No ballots to print\n");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
