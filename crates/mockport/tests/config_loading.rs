//! Loading a server configuration and its project files from disk.

use mockport::config::ServerConfig;
use mockport::model::SoapResourceType;
use mockport::server::MockServer;
use mockport::store::ConfigurationStore;
use reqwest::Client;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const WSDL: &str = r#"<definitions name="Inventory" targetNamespace="urn:inventory"/>"#;

fn write_fixture(dir: &Path, journal: bool) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("projects")).unwrap();
    fs::write(dir.join("projects/inventory.wsdl"), WSDL).unwrap();
    fs::write(
        dir.join("projects/inventory.yaml"),
        r#"
id: inventory
name: Inventory
type: soap
resources:
  - id: inventory-wsdl
    name: inventory.wsdl
    type: WSDL
    file: inventory.wsdl
ports:
  - name: InventoryPort
    uri: inventory
    operations:
      - id: get-stock
        name: GetStock
        responses:
          - name: Stock
            body: <stock>12</stock>
"#,
    )
    .unwrap();
    fs::write(
        dir.join("projects/users.json"),
        r#"{
            "id": "users",
            "name": "Users",
            "type": "rest",
            "applications": [{
                "id": "accounts",
                "name": "Accounts",
                "resources": [{
                    "name": "User",
                    "uri": "/users/{id}",
                    "methods": [{
                        "name": "Get user",
                        "httpMethod": "GET",
                        "responses": [{"name": "User", "body": "{}"}]
                    }]
                }]
            }]
        }"#,
    )
    .unwrap();

    let mut config = String::from(
        r#"
listen:
  host: 127.0.0.1
  port: 0
context_path: /mockport
resource_directory: resources
projects:
  - projects/inventory.yaml
  - projects/users.json
"#,
    );
    if journal {
        config.push_str("recorder:\n  capacity: 50\n  journal: logs/invocations.jsonl\n");
    }
    let path = dir.join("mockport.yaml");
    fs::write(&path, config).unwrap();
    path
}

#[test]
fn test_from_file_resolves_relative_paths() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::from_file(write_fixture(dir.path(), true)).unwrap();

    assert_eq!(config.context_path, "/mockport");
    assert_eq!(config.projects[0], dir.path().join("projects/inventory.yaml"));
    assert_eq!(
        config.resource_directory.as_deref(),
        Some(dir.path().join("resources").as_path())
    );
    assert_eq!(
        config.recorder.journal.as_deref(),
        Some(dir.path().join("logs/invocations.jsonl").as_path())
    );
    assert_eq!(config.recorder.capacity, 50);
}

#[test]
fn test_invalid_context_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mockport.yaml");
    fs::write(&path, "context_path: mockport\n").unwrap();
    assert!(ServerConfig::from_file(&path).is_err());
}

#[tokio::test]
async fn test_from_config_loads_projects_and_resources() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::from_file(write_fixture(dir.path(), false)).unwrap();
    let server = MockServer::from_config(&config).await.unwrap();
    let state = server.state();

    assert_eq!(state.catalog.list_projects().len(), 2);
    assert!(state.catalog.resolve_port("inventory", "inventory").is_some());
    assert!(state
        .catalog
        .resolve_application("users", "accounts")
        .is_some());

    let resources = state.resources.as_ref().unwrap();
    let wsdl = resources.find("inventory", Some(SoapResourceType::Wsdl));
    assert_eq!(wsdl.len(), 1);
    assert!(dir
        .path()
        .join("resources/wsdl/inventory-wsdl.xml")
        .exists());
    assert_eq!(resources.load_content("inventory-wsdl").unwrap(), WSDL);
}

#[tokio::test]
async fn test_missing_project_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mockport.yaml");
    fs::write(&path, "projects:\n  - missing.yaml\n").unwrap();
    let config = ServerConfig::from_file(&path).unwrap();
    assert!(MockServer::from_config(&config).await.is_err());
}

#[tokio::test]
async fn test_serves_context_path_wsdl_and_journal() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::from_file(write_fixture(dir.path(), true)).unwrap();
    let server = MockServer::from_config(&config).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/mockport", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run(listener, async move {
        let _ = rx.await;
    }));

    let client = Client::new();
    let response = client
        .get(format!("{base}/mock/soap/project/inventory/inventory?wsdl"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), WSDL);

    let response = client
        .post(format!("{base}/mock/soap/project/inventory/inventory"))
        .body("<GetStock/>")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "<stock>12</stock>");

    let response = client
        .get(format!("{base}/mock/rest/project/users/application/accounts/users/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    drop(client);
    let _ = tx.send(());
    handle.await.unwrap().unwrap();

    let journal_path = dir.path().join("logs/invocations.jsonl");
    let mut journal = String::new();
    for _ in 0..50 {
        journal = fs::read_to_string(&journal_path).unwrap();
        if journal.lines().count() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    let records: Vec<serde_json::Value> = journal
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["target"]["operation_id"], "get-stock");
    assert_eq!(records[1]["protocol"], "rest");
}
