//! Interface-conformance tests for both discovery providers.

use std::time::Duration;
use std::time::Instant;

use portreap_ports::DiscoveryError;
use portreap_ports::MockProvider;
use portreap_ports::PortProvider;

#[tokio::test]
async fn test_mock_provider_returns_sample_set() {
    let provider = MockProvider::new().with_delay(Duration::ZERO);
    let entries = provider.list(Duration::from_secs(2)).await.unwrap();

    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.port > 0));

    let ports: Vec<u16> = entries.iter().map(|e| e.port).collect();
    let mut sorted = ports.clone();
    sorted.sort_unstable();
    assert_eq!(ports, sorted);
}

#[tokio::test]
async fn test_mock_provider_honors_timeout() {
    let provider = MockProvider::new().with_delay(Duration::from_secs(5));
    let start = Instant::now();
    let err = provider.list(Duration::from_millis(20)).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::TimedOut { .. }));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_mock_provider_serves_custom_records() {
    let records = MockProvider::new()
        .with_delay(Duration::ZERO)
        .list(Duration::from_secs(2))
        .await
        .unwrap();
    let provider = MockProvider::with_records(records[..2].to_vec()).with_delay(Duration::ZERO);

    let entries = provider.list(Duration::from_secs(2)).await.unwrap();
    assert_eq!(entries, records[..2].to_vec());
}

#[cfg(unix)]
mod fake_utility {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use portreap_ports::LsofProvider;
    use tempfile::TempDir;

    use super::*;

    /// Writes an executable shell script standing in for lsof.
    fn fake_lsof(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("lsof");
        fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[tokio::test]
    async fn test_live_provider_parses_utility_output() {
        let dir = TempDir::new().unwrap();
        let script = fake_lsof(
            &dir,
            "printf 'p100\\ncsshd\\nLalice\\nf3\\nPTCP\\nn*:22\\nTST=LISTEN\\n'\n",
        );

        let provider = LsofProvider::with_program(script.to_string_lossy());
        let entries = provider.list(Duration::from_secs(2)).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pid, 100);
        assert_eq!(entries[0].process, "sshd");
        assert_eq!(entries[0].user, "alice");
        assert_eq!(entries[0].protocol, "tcp");
        assert_eq!(entries[0].port, 22);
        assert_eq!(entries[0].address, "*");
        assert_eq!(entries[0].state, "LISTEN");
    }

    #[tokio::test]
    async fn test_live_provider_reports_utility_failure() {
        let dir = TempDir::new().unwrap();
        let script = fake_lsof(&dir, "echo 'no network devices' >&2\nexit 3\n");

        let provider = LsofProvider::with_program(script.to_string_lossy());
        let err = provider.list(Duration::from_secs(2)).await.unwrap_err();

        match err {
            DiscoveryError::Utility { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "no network devices");
            }
            other => panic!("expected Utility error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_live_provider_reports_launch_failure() {
        let provider = LsofProvider::with_program("/nonexistent/path/to/lsof");
        let err = provider.list(Duration::from_secs(2)).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_live_provider_times_out_on_hung_utility() {
        let dir = TempDir::new().unwrap();
        let script = fake_lsof(&dir, "sleep 30\n");

        let provider = LsofProvider::with_program(script.to_string_lossy());
        let start = Instant::now();
        let err = provider.list(Duration::from_millis(50)).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_live_provider_fails_on_invalid_pid() {
        let dir = TempDir::new().unwrap();
        let script = fake_lsof(&dir, "printf 'pnot-a-pid\\ncsshd\\n'\n");

        let provider = LsofProvider::with_program(script.to_string_lossy());
        let err = provider.list(Duration::from_secs(2)).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Parse(_)));
    }
}
