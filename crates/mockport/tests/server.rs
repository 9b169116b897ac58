//! HTTP tests against a server bound to an ephemeral port.

use mockport::config::{convert_project, ProjectFile};
use mockport::recording::InvocationLog;
use mockport::server::{
    MockServer, ServerState, INVOCATIONS_PATH, METRICS_PATH, SEQUENCES_PATH,
};
use mockport::CatalogStore;
use reqwest::Client;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const PROJECTS: [&str; 2] = [
    r#"
id: billing
name: Billing
type: soap
ports:
  - name: BillingPort
    uri: billing
    operations:
      - id: get-invoice
        name: GetInvoice
        soapAction: urn:GetInvoice
        responses:
          - name: Invoice
            body: <invoice>42</invoice>
            headers:
              - name: Content-Type
                value: text/xml
      - id: get-payment
        name: GetPayment
        soapAction: urn:GetPayment
        responseStrategy: SEQUENCE
        responses:
          - name: Pending
            body: <payment>pending</payment>
          - name: Paid
            body: <payment>paid</payment>
"#,
    r#"
id: shop
name: Shop
type: rest
applications:
  - id: catalog
    name: Catalog
    resources:
      - name: Product
        uri: /products/{sku}
        methods:
          - id: get-product
            name: Get product
            httpMethod: GET
            responses:
              - name: Product
                httpStatusCode: 200
                body: '{"sku": "${PATH_PARAMETER(key="sku")}"}'
                usingExpressions: true
                headers:
                  - name: X-Trace
                    value: one
                  - name: X-Trace
                    value: two
"#,
];

struct TestServer {
    addr: SocketAddr,
    log: Arc<InvocationLog>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), anyhow::Error>>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

async fn start_server() -> TestServer {
    let catalog = Arc::new(CatalogStore::new());
    for source in PROJECTS {
        let file: ProjectFile = serde_yaml::from_str(source).unwrap();
        convert_project(file, Path::new("."))
            .unwrap()
            .install(&catalog, None)
            .unwrap();
    }
    let log = Arc::new(InvocationLog::new(100));
    let state = ServerState::new(catalog, log.clone(), log.clone(), "");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(MockServer::from_state(state).run(listener, async move {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        log,
        shutdown: Some(tx),
        handle,
    }
}

#[tokio::test]
async fn test_soap_mock_response() {
    let server = start_server().await;
    let client = Client::new();

    let response = client
        .post(server.url("/mock/soap/project/billing/billing"))
        .header("Content-Type", "text/xml")
        .header("SOAPAction", "\"urn:GetInvoice\"")
        .body("<Envelope><Body><GetInvoice/></Body></Envelope>")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/xml");
    assert_eq!(response.text().await.unwrap(), "<invoice>42</invoice>");

    server.stop().await;
}

#[tokio::test]
async fn test_soap_fault_for_unknown_operation() {
    let server = start_server().await;
    let client = Client::new();

    let response = client
        .post(server.url("/mock/soap/project/billing/billing"))
        .body("<Envelope><Body><CancelInvoice/></Body></Envelope>")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.headers()["content-type"],
        "text/xml; charset=utf-8"
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("<faultcode>soapenv:Client</faultcode>"));

    server.stop().await;
}

#[tokio::test]
async fn test_rest_response_with_duplicate_headers() {
    let server = start_server().await;
    let client = Client::new();

    let response = client
        .get(server.url("/mock/rest/project/shop/application/catalog/products/A-7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let traces: Vec<_> = response
        .headers()
        .get_all("x-trace")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(traces, vec!["one", "two"]);
    assert_eq!(response.text().await.unwrap(), r#"{"sku": "A-7"}"#);

    server.stop().await;
}

#[tokio::test]
async fn test_rest_not_found() {
    let server = start_server().await;
    let client = Client::new();

    let response = client
        .get(server.url("/mock/rest/project/shop/application/catalog/baskets/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no_matching_resource");

    server.stop().await;
}

#[tokio::test]
async fn test_invocations_endpoint() {
    let server = start_server().await;
    let client = Client::new();

    for _ in 0..2 {
        client
            .get(server.url("/mock/rest/project/shop/application/catalog/products/1"))
            .send()
            .await
            .unwrap();
    }
    client
        .get(server.url("/unknown"))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .get(server.url(INVOCATIONS_PATH))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(body["invocations"][0]["target"]["operation_id"], "get-product");
    assert_eq!(body["invocations"][2]["target"]["kind"], "unmatched");

    let body: serde_json::Value = client
        .get(server.url(&format!("{INVOCATIONS_PATH}?operationId=get-product")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);

    let response = client
        .delete(server.url(INVOCATIONS_PATH))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(server.log.is_empty());

    server.stop().await;
}

async fn get_payment(client: &Client, server: &TestServer) -> String {
    client
        .post(server.url("/mock/soap/project/billing/billing"))
        .header("SOAPAction", "urn:GetPayment")
        .body("<Envelope><Body><GetPayment/></Body></Envelope>")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sequences_endpoint_restarts_selection() {
    let server = start_server().await;
    let client = Client::new();

    assert_eq!(get_payment(&client, &server).await, "<payment>pending</payment>");
    assert_eq!(get_payment(&client, &server).await, "<payment>paid</payment>");

    let response = client
        .delete(server.url(&format!("{SEQUENCES_PATH}?operationId=get-payment")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(get_payment(&client, &server).await, "<payment>pending</payment>");

    let response = client
        .delete(server.url(SEQUENCES_PATH))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(get_payment(&client, &server).await, "<payment>pending</payment>");
    assert_eq!(get_payment(&client, &server).await, "<payment>paid</payment>");

    server.stop().await;
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = start_server().await;
    let client = Client::new();

    client
        .get(server.url("/mock/rest/project/shop/application/catalog/products/1"))
        .send()
        .await
        .unwrap();

    let response = client.get(server.url(METRICS_PATH)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("mockport_requests_total"));

    server.stop().await;
}
