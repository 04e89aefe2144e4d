use serde_json::json;
use tectonic_stats_verifier::cluster::{
    ClusterApi, ClusterConfigReader, KubeCluster, TECTONIC_SYSTEM_NAMESPACE,
};
use tectonic_stats_verifier::error::ClusterError;
use tectonic_stats_verifier::logs::LogVerifier;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cluster_for(server: &MockServer) -> KubeCluster {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = kube::Config::new(server.uri().parse().unwrap());
    KubeCluster::new(kube::Client::try_from(config).unwrap())
}

fn status(code: u16, reason: &str, message: &str) -> serde_json::Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

#[tokio::test]
async fn lists_pods_with_container_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": {"resourceVersion": "42"},
            "items": [
                {
                    "metadata": {"name": "tectonic-stats-emitter-7d9f", "namespace": "tectonic-system"},
                    "spec": {"containers": [{"name": "emitter"}, {"name": "proxy"}]}
                },
                {
                    "metadata": {"name": "tectonic-console-1", "namespace": "tectonic-system"},
                    "spec": {"containers": [{"name": "console"}]}
                }
            ]
        })))
        .mount(&server)
        .await;

    let pods = cluster_for(&server)
        .list_pods(TECTONIC_SYSTEM_NAMESPACE)
        .await
        .unwrap();

    assert_eq!(pods.len(), 2);
    assert_eq!(pods[0].name, "tectonic-stats-emitter-7d9f");
    assert_eq!(pods[0].containers, vec!["emitter", "proxy"]);
}

#[tokio::test]
async fn list_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/pods"))
        .respond_with(ResponseTemplate::new(403).set_body_json(status(
            403,
            "Forbidden",
            "pods is forbidden",
        )))
        .mount(&server)
        .await;

    let error = cluster_for(&server)
        .list_pods(TECTONIC_SYSTEM_NAMESPACE)
        .await
        .unwrap_err();

    assert!(matches!(error, ClusterError::ListPods(_)));
    assert!(error.to_string().starts_with("could not list pods: "));
}

#[tokio::test]
async fn fetches_logs_of_one_container() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/namespaces/tectonic-system/pods/tectonic-stats-emitter-7d9f/log",
        ))
        .and(query_param("container", "emitter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("report successfully sent\n"))
        .expect(1)
        .mount(&server)
        .await;

    let logs = cluster_for(&server)
        .pod_logs(TECTONIC_SYSTEM_NAMESPACE, "tectonic-stats-emitter-7d9f", "emitter")
        .await
        .unwrap();

    assert_eq!(logs, b"report successfully sent\n");
}

#[tokio::test]
async fn logs_are_returned_as_raw_bytes() {
    let server = MockServer::start().await;
    let body = b"\xff\xfe binary junk\nreport successfully sent\n".to_vec();
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/namespaces/tectonic-system/pods/tectonic-stats-emitter-7d9f/log",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let logs = cluster_for(&server)
        .pod_logs(TECTONIC_SYSTEM_NAMESPACE, "tectonic-stats-emitter-7d9f", "emitter")
        .await
        .unwrap();

    assert_eq!(logs, body);
}

#[tokio::test]
async fn log_check_passes_on_non_utf8_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": {"resourceVersion": "42"},
            "items": [{
                "metadata": {"name": "tectonic-stats-emitter-7d9f", "namespace": "tectonic-system"},
                "spec": {"containers": [{"name": "emitter"}]}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/namespaces/tectonic-system/pods/tectonic-stats-emitter-7d9f/log",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\xff\xfe binary junk\nreport successfully sent\n".to_vec()),
        )
        .mount(&server)
        .await;

    let result = LogVerifier::default().verify(&cluster_for(&server)).await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn log_error_status_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/namespaces/tectonic-system/pods/tectonic-stats-emitter-7d9f/log",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(status(
            500,
            "InternalError",
            "container is restarting",
        )))
        .mount(&server)
        .await;

    let error = cluster_for(&server)
        .pod_logs(TECTONIC_SYSTEM_NAMESPACE, "tectonic-stats-emitter-7d9f", "emitter")
        .await
        .unwrap_err();

    assert_eq!(error, ClusterError::LogStatus(500));
    assert_eq!(error.to_string(), "expected 200 from log response, got 500");
}

#[tokio::test]
async fn reads_tectonic_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/configmaps/tectonic-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "tectonic-config", "namespace": "tectonic-system"},
            "data": {"clusterID": "cluster-1", "installerPlatform": "aws"}
        })))
        .mount(&server)
        .await;

    let data = ClusterConfigReader::default()
        .read(&cluster_for(&server))
        .await
        .unwrap();

    assert_eq!(data.get("clusterID").map(String::as_str), Some("cluster-1"));
    assert_eq!(data.len(), 2);
}

#[tokio::test]
async fn config_map_without_data_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/configmaps/tectonic-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "tectonic-config", "namespace": "tectonic-system"}
        })))
        .mount(&server)
        .await;

    let data = ClusterConfigReader::default()
        .read(&cluster_for(&server))
        .await
        .unwrap();

    assert!(data.is_empty());
}

#[tokio::test]
async fn missing_config_map_names_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/tectonic-system/configmaps/tectonic-config"))
        .respond_with(ResponseTemplate::new(404).set_body_json(status(
            404,
            "NotFound",
            "configmaps \"tectonic-config\" not found",
        )))
        .mount(&server)
        .await;

    let error = ClusterConfigReader::default()
        .read(&cluster_for(&server))
        .await
        .unwrap_err();

    assert!(
        error
            .to_string()
            .starts_with("failed to find ConfigMap \"tectonic-config\": ")
    );
}
