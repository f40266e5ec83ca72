use sneakers_e2e_tests::{base_url, prepare_env, spawn_server};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = prepare_env("test_health").await.unwrap();
    let base_url = base_url(&args);

    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();

    let url = base_url.join("health").unwrap();
    let response = client.get(url).send().await.unwrap();
    info! {"Response: {:#?}", response};
    assert!(response.status().is_success());
    assert_eq!("OK", response.text().await.unwrap());
}

#[tokio::test]
#[traced_test]
async fn test_api_docs() {
    let (args, _config_guard) = prepare_env("test_api_docs").await.unwrap();
    let base_url = base_url(&args);

    spawn_server(args).await.unwrap();

    let url = base_url.join("api-docs/openapi.json").unwrap();
    let response = reqwest::get(url).await.unwrap();
    assert!(response.status().is_success());
    let docs: serde_json::Value = response.json().await.unwrap();
    let paths = docs["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/sneaker"));
    assert!(paths.contains_key("/api/sneaker/{id}"));
    assert!(paths.contains_key("/api/user/login"));
}
