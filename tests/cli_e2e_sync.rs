//! E2E tests for the `sync` command.

mod common;
use common::prelude::*;

#[test]
fn test_sync_bootstraps_env() {
    let fixture = TestFixture::new().with_app("sonarr");

    fixture.command().arg("sync").assert().success();

    let env = std::fs::read_to_string(fixture.env_file()).unwrap();
    assert!(env.contains("DOCKER_MULTIPLE_STORAGE"));
    assert!(env.contains("TZ="));
}

#[test]
fn test_sync_merges_template_variables() {
    let fixture = TestFixture::new()
        .with_app("sonarr")
        .with_template_file(
            "sonarr",
            ".env",
            "SONARR__ENABLED='false'\nSONARR__TAG='latest'\n",
        )
        .with_template_file("sonarr", ".env.app.sonarr", "SONARR_LOG_LEVEL='info'\n");

    fixture
        .command()
        .args(["enable", "SONARR"])
        .assert()
        .success();
    fixture.command().arg("sync").assert().success();

    let env = std::fs::read_to_string(fixture.env_file()).unwrap();
    // Template default arrives, the user's enablement survives.
    assert!(env.contains("SONARR__TAG='latest'"));
    assert!(env.contains("SONARR__ENABLED='true'"));

    let app_env = std::fs::read_to_string(fixture.app_env_file("SONARR")).unwrap();
    assert!(app_env.contains("SONARR_LOG_LEVEL='info'"));
}

#[test]
fn test_sync_formats_sections_with_headers() {
    let fixture = TestFixture::new()
        .with_app("sonarr")
        .with_template_file("sonarr", ".env", "SONARR__TAG='latest'\n");

    fixture
        .command()
        .args(["enable", "SONARR"])
        .assert()
        .success();
    fixture.command().arg("sync").assert().success();

    let env = std::fs::read_to_string(fixture.env_file()).unwrap();
    assert!(env.contains("### Sonarr"));
}

#[test]
fn test_sync_twice_is_stable() {
    let fixture = TestFixture::new()
        .with_app("sonarr")
        .with_template_file("sonarr", ".env", "SONARR__TAG='latest'\n");

    fixture
        .command()
        .args(["enable", "SONARR"])
        .assert()
        .success();
    fixture.command().arg("sync").assert().success();
    let first = std::fs::read(fixture.env_file()).unwrap();

    fixture.command().arg("sync").assert().success();
    let second = std::fs::read(fixture.env_file()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_sync_picks_up_template_change() {
    let fixture = TestFixture::new()
        .with_app("sonarr")
        .with_template_file("sonarr", ".env", "SONARR__TAG='latest'\n");

    fixture
        .command()
        .args(["enable", "SONARR"])
        .assert()
        .success();
    fixture.command().arg("sync").assert().success();

    // Keep the template edit clearly newer than the sync sentinel.
    std::thread::sleep(std::time::Duration::from_millis(50));
    let fixture = fixture.with_template_file(
        "sonarr",
        ".env",
        "SONARR__TAG='latest'\nSONARR__UMASK='002'\n",
    );
    fixture.command().arg("sync").assert().success();

    let env = std::fs::read_to_string(fixture.env_file()).unwrap();
    assert!(env.contains("SONARR__UMASK='002'"));
}

#[test]
fn test_sync_single_app() {
    let fixture = TestFixture::new()
        .with_app("sonarr")
        .with_template_file("sonarr", ".env", "SONARR__TAG='latest'\n");

    fixture
        .command()
        .args(["enable", "SONARR"])
        .assert()
        .success();
    fixture
        .command()
        .args(["sync", "SONARR"])
        .assert()
        .success();

    let env = std::fs::read_to_string(fixture.env_file()).unwrap();
    assert!(env.contains("SONARR__TAG='latest'"));
}
