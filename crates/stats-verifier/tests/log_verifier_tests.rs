mod common;

use common::{FakeCluster, pod};
use tectonic_stats_verifier::error::{ClusterError, GatherError, LogsError};
use tectonic_stats_verifier::logs::LogVerifier;

#[tokio::test]
async fn passes_when_marker_is_logged() {
    let cluster = FakeCluster::new()
        .with_pods(vec![
            pod("tectonic-stats-emitter-1", &["emitter", "sidecar"]),
            pod("kube-dns-1", &["dns"]),
        ])
        .with_logs("tectonic-stats-emitter-1", "emitter", "starting\nreport successfully sent\n");

    let result = LogVerifier::default().verify(&cluster).await;

    assert_eq!(result, Ok(()));
    assert_eq!(cluster.log_requests(), vec!["tectonic-stats-emitter-1/emitter"]);
}

#[tokio::test]
async fn concatenates_logs_of_every_matching_pod() {
    let cluster = FakeCluster::new()
        .with_pods(vec![
            pod("tectonic-stats-emitter-a", &["emitter"]),
            pod("tectonic-stats-emitter-b", &["emitter"]),
        ])
        .with_logs("tectonic-stats-emitter-a", "emitter", "a\n")
        .with_logs("tectonic-stats-emitter-b", "emitter", "b\n");

    let logs = LogVerifier::default().gather_logs(&cluster).await.unwrap();

    assert_eq!(logs, b"a\nb\n");
}

#[tokio::test]
async fn no_matching_pods() {
    let cluster = FakeCluster::new().with_pods(vec![pod("kube-dns-1", &["dns"])]);

    let error = LogVerifier::default().verify(&cluster).await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "failed to gather logs for tectonic-system/tectonic-stats-emitter, \
         failed to find pods with prefix \"tectonic-stats-emitter\" in namespace \"tectonic-system\""
    );
}

#[tokio::test]
async fn matching_pod_without_containers() {
    let cluster = FakeCluster::new().with_pods(vec![pod("tectonic-stats-emitter-1", &[])]);

    let error = LogVerifier::default().gather_logs(&cluster).await.unwrap_err();

    assert_eq!(
        error,
        GatherError::NoContainers {
            pod: "tectonic-stats-emitter-1".into()
        }
    );
    assert!(error.to_string().ends_with("pod has no containers"));
}

#[tokio::test]
async fn missing_marker() {
    let cluster = FakeCluster::new()
        .with_pods(vec![pod("tectonic-stats-emitter-1", &["emitter"])])
        .with_logs("tectonic-stats-emitter-1", "emitter", "report failed: 503\n");

    let error = LogVerifier::default().verify(&cluster).await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "expected logs to contain \"report successfully sent\""
    );
}

#[tokio::test]
async fn log_status_error_is_reported() {
    let cluster = FakeCluster::new().with_pods(vec![pod("tectonic-stats-emitter-1", &["emitter"])]);
    cluster.set_logs(
        "tectonic-stats-emitter-1",
        "emitter",
        Err(ClusterError::LogStatus(500)),
    );

    let error = LogVerifier::default().verify(&cluster).await.unwrap_err();

    assert!(matches!(
        error,
        LogsError::Gather {
            source: GatherError::Cluster(ClusterError::LogStatus(500)),
            ..
        }
    ));
    assert!(error.to_string().ends_with("expected 200 from log response, got 500"));
}

#[tokio::test]
async fn list_error_is_reported() {
    let cluster = FakeCluster::new();
    cluster.set_pods(Err(ClusterError::ListPods("forbidden".into())));

    let error = LogVerifier::default().verify(&cluster).await.unwrap_err();

    assert!(error.to_string().ends_with("could not list pods: forbidden"));
}
