use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn help_lists_release_flags() {
    let mut cmd = Command::cargo_bin("play-release").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("--credentials")
                .and(predicate::str::contains("--track"))
                .and(predicate::str::contains("--aab"))
                .and(predicate::str::contains("--notes")),
        );
}

#[test]
fn missing_credentials_file_fails_with_descriptive_error() {
    let workdir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("play-release").expect("Binary exists");

    cmd.current_dir(workdir.path())
        .env_remove("PLAY_CREDENTIALS")
        .arg("--credentials")
        .arg("no-such-key.json")
        .arg("--aab")
        .arg("app-release.aab");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read service account key"))
        .stdout(predicate::str::contains("Created edit").not());
}

#[test]
fn unparseable_config_file_fails_before_authentication() {
    let workdir = tempdir().unwrap();
    let config = workdir.path().join("release.yaml");
    std::fs::write(&config, "track: [:::").unwrap();

    let mut cmd = Command::cargo_bin("play-release").expect("Binary exists");
    cmd.current_dir(workdir.path()).arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config YAML"));
}

/// Service-account key whose token endpoint is the given mock server.
fn key_for_server(dir: &std::path::Path, server: &httpmock::MockServer) -> PathBuf {
    let mut key: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/service-account.json")).unwrap();
    key["token_uri"] = serde_json::Value::String(server.url("/token"));
    let path = dir.join("play-service-account.json");
    std::fs::write(&path, key.to_string()).unwrap();
    path
}

#[test]
fn release_prints_progress_lines_in_order() {
    use httpmock::prelude::*;
    use serde_json::json;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(200)
            .json_body(json!({ "access_token": "ya29.cli", "expires_in": 3599 }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/androidpublisher/v3/applications/app.spread/edits")
            .header("authorization", "Bearer ya29.cli");
        then.status(200).json_body(json!({ "id": "E1" }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/upload/androidpublisher/v3/applications/app.spread/edits/E1/bundles");
        then.status(200).json_body(json!({ "versionCode": 42 }));
    });
    let track = server.mock(|when, then| {
        when.method(PUT)
            .path("/androidpublisher/v3/applications/app.spread/edits/E1/tracks/beta")
            .json_body(json!({
                "releases": [{
                    "versionCodes": ["42"],
                    "status": "completed",
                    "releaseNotes": [{ "language": "en-US", "text": "Smoother sync" }]
                }]
            }));
        then.status(200).json_body(json!({ "track": "beta", "releases": [] }));
    });
    let commit = server.mock(|when, then| {
        when.method(POST)
            .path("/androidpublisher/v3/applications/app.spread/edits/E1:commit")
            .header("content-length", "0");
        then.status(200).json_body(json!({ "id": "E1" }));
    });

    let workdir = tempdir().unwrap();
    let key = key_for_server(workdir.path(), &server);
    let aab = workdir.path().join("app-release.aab");
    std::fs::write(&aab, b"aab bytes").unwrap();

    let mut cmd = Command::cargo_bin("play-release").expect("Binary exists");
    cmd.current_dir(workdir.path())
        .env_remove("PLAY_PACKAGE_NAME")
        .arg("--credentials")
        .arg(&key)
        .arg("--aab")
        .arg(&aab)
        .arg("--track")
        .arg("beta")
        .arg("--notes")
        .arg("Smoother sync")
        .arg("--api-base-url")
        .arg(server.base_url());

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let expected = [
        "Created edit: E1".to_string(),
        format!("Uploading {}...", aab.display()),
        "Uploaded bundle: versionCode=42".to_string(),
        "Assigned to track: beta".to_string(),
        "Committed! Release is live.".to_string(),
    ];
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, expected, "stdout was: {stdout}");

    track.assert();
    commit.assert();
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn run_logs_credential_failure_and_returns_error() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use play_release::cli::{run, Cli};

    let cli = Cli {
        credentials: Some(PathBuf::from("/nonexistent/play-service-account.json")),
        ..Cli::default()
    };

    let err = run(cli).await.unwrap_err();
    assert!(err.to_string().contains("cannot read service account key"));

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Failed to read service account key")),
        "Expected a credential failure event, got: {:?}",
        event_msgs
    );
}
