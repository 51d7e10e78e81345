//! Integration tests for Cacheup

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn cacheup(state_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("cacheup");
        cmd.env("CACHEUP_STATE_DIR", state_dir.path())
            .env_remove("CACHEUP_CONFIG")
            .env_remove("CACHEUP_TOKEN")
            .env_remove("CACHEUP_TEAM")
            .env_remove("CACHEUP_HOST")
            .env_remove("CACHEUP_STORAGE_PROVIDER")
            .env_remove("CACHEUP_STORAGE_PATH")
            .env_remove("GITHUB_ENV")
            .arg("--no-local");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        cacheup(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache server"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        cacheup(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cacheup"));
    }

    #[test]
    fn status_without_record() {
        let temp = TempDir::new().unwrap();
        cacheup(&temp)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache server is recorded"));
    }

    #[test]
    fn stop_without_record_is_noop() {
        let temp = TempDir::new().unwrap();
        cacheup(&temp)
            .arg("stop")
            .assert()
            .success()
            .stdout(predicate::str::contains("nothing to stop"));
    }

    #[test]
    fn init_creates_project_config() {
        let temp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        cacheup(&temp)
            .args(["init", "--path"])
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Created project config"));

        assert!(project.path().join(".cacheup.toml").is_file());
    }

    #[test]
    fn start_requires_token() {
        let temp = TempDir::new().unwrap();
        // Point --config at a path that doesn't exist so a developer's
        // global config can't provide the token
        cacheup(&temp)
            .arg("--config")
            .arg(temp.path().join("no-config.toml"))
            .args(["start", "--team", "team_ci", "--attempts", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("server.token"));
    }

    #[test]
    fn start_fails_after_configured_attempts() {
        let temp = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();
        let config_path = config_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[server]\ncommand = \"cacheup-test-no-such-binary\"\n",
        )
        .unwrap();

        cacheup(&temp)
            .arg("--config")
            .arg(&config_path)
            .args([
                "start",
                "--token",
                "tok",
                "--team",
                "team_ci",
                "--attempts",
                "2",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("after 2 attempts"));

        // No record may exist after a failed launch
        assert!(!temp.path().join("server.json").exists());
    }

    #[test]
    fn start_refuses_second_server() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("server.json"),
            r#"{
              "id": "9d2f0d53-5f2e-4c3a-9a65-0a2b6f9c1e11",
              "pid": 12345,
              "port": 9000,
              "endpoint": "http://127.0.0.1:9000",
              "created_at": "2026-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        cacheup(&temp)
            .args(["start", "--token", "tok", "--team", "team_ci"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already recorded"));
    }

    #[cfg(unix)]
    #[test]
    fn start_then_stop_roundtrip() {
        // The spawned "server" is just a sleeping process; readiness is
        // satisfied by a listener the test holds on the probed port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let temp = TempDir::new().unwrap();
        let config_dir = TempDir::new().unwrap();
        let config_path = config_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[server]\ncommand = \"sleep\"\nargs = [\"30\"]\n",
        )
        .unwrap();
        let env_file = config_dir.path().join("pipeline.env");

        cacheup(&temp)
            .arg("--config")
            .arg(&config_path)
            .args([
                "start",
                "--token",
                "tok",
                "--team",
                "team_ci",
                "--host",
                "http://127.0.0.1",
            ])
            .arg("--port")
            .arg(port.to_string())
            .arg("--env-file")
            .arg(&env_file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache server started"));

        let exports = std::fs::read_to_string(&env_file).unwrap();
        assert!(exports.contains(&format!("API_ENDPOINT=http://127.0.0.1:{port}")));
        assert!(exports.contains("ACCESS_TOKEN=tok"));
        assert!(exports.contains("TEAM_ID=team_ci"));
        assert!(temp.path().join("server.json").is_file());

        cacheup(&temp)
            .arg("stop")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache server stopped"));
        assert!(!temp.path().join("server.json").exists());
    }
}
