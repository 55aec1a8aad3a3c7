//! Assistant -> bridge -> TCP -> command server -> dispatcher -> host, in process

use std::time::{Duration, Instant};

use rhinomcp_protocol::{CommandResult, MAX_MESSAGE_SIZE};
use rhinomcp_server::{
    BridgeOptions, CommandServer, Dispatcher, McpBridge, MemoryDocumentHost, RelayClient,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

struct Stack {
    stdin: DuplexStream,
    stdout: Lines<BufReader<DuplexStream>>,
    _server_shutdown: broadcast::Sender<()>,
}

async fn start_server(host: MemoryDocumentHost) -> (String, broadcast::Sender<()>) {
    let dispatcher = Dispatcher::with_host(host).unwrap();
    let server = CommandServer::bind("127.0.0.1:0", dispatcher, MAX_MESSAGE_SIZE)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(server.run(rx));
    (addr, tx)
}

impl Stack {
    async fn start(host: MemoryDocumentHost) -> Self {
        let (addr, server_shutdown) = start_server(host).await;

        let (stdin, bridge_in) = tokio::io::duplex(64 * 1024);
        let (bridge_out, stdout) = tokio::io::duplex(64 * 1024);
        let bridge = McpBridge::new(RelayClient::new(addr), BridgeOptions::default());
        tokio::spawn(async move {
            bridge
                .run(BufReader::new(bridge_in), bridge_out, std::future::pending())
                .await
        });

        Self {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            _server_shutdown: server_shutdown,
        }
    }

    async fn call(&mut self, line: &str) -> Value {
        self.stdin.write_all(line.as_bytes()).await.unwrap();
        self.stdin.write_all(b"\n").await.unwrap();
        let line = tokio::time::timeout(Duration::from_secs(5), self.stdout.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }
}

fn embedded(response: &Value) -> CommandResult {
    serde_json::from_str(response["result"]["result"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn scene_info_on_empty_document() {
    let mut stack = Stack::start(MemoryDocumentHost::new()).await;

    let resp = stack
        .call(r#"{"method":"tools/call","id":7,"params":{"name":"scene_tools.get_scene_info","parameters":{}}}"#)
        .await;

    assert_eq!(resp["id"], 7);
    let encoded = resp["result"]["result"].as_str().unwrap();
    assert!(encoded.starts_with(r#"{"success":true,"result":{"#));
    let result = embedded(&resp);
    assert_eq!(result.result.unwrap()["objectCount"], 0);
}

#[tokio::test]
async fn create_sphere_without_document() {
    let mut stack = Stack::start(MemoryDocumentHost::without_document()).await;

    let resp = stack
        .call(r#"{"method":"tools/call","id":9,"params":{"name":"geometry_tools.create_sphere","parameters":{"centerX":0,"centerY":0,"centerZ":0,"radius":5}}}"#)
        .await;

    assert_eq!(resp["id"], 9);
    assert!(resp.get("error").is_none(), "not a transport/protocol error");
    let result = embedded(&resp);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("no active document"));
}

#[tokio::test]
async fn modeling_session() {
    let mut stack = Stack::start(MemoryDocumentHost::new()).await;

    let init = stack.call(r#"{"method":"initialize","id":1,"params":{}}"#).await;
    assert_eq!(init["result"]["capabilities"]["tools"].as_array().unwrap().len(), 6);

    let layer = stack
        .call(r#"{"method":"tools/call","id":2,"params":{"name":"scene_tools.create_layer","parameters":{"name":"Furniture","color":"purple"}}}"#)
        .await;
    assert!(embedded(&layer).success);

    let sphere = stack
        .call(r#"{"method":"tools/call","id":3,"params":{"name":"geometry_tools.create_sphere","parameters":{"centerX":1,"centerY":2,"centerZ":3,"radius":0.5,"color":"red"}}}"#)
        .await;
    let sphere = embedded(&sphere).result.unwrap();
    assert_eq!(sphere["layer"], "Furniture");
    assert!(uuid::Uuid::parse_str(sphere["objectId"].as_str().unwrap()).is_ok());

    let cylinder = stack
        .call(r#"{"method":"tools/call","id":4,"params":{"name":"geometry_tools.create_cylinder","parameters":{"baseX":0,"baseY":0,"baseZ":0,"height":2,"radius":1}}}"#)
        .await;
    assert!(embedded(&cylinder).success);

    let info = stack
        .call(r#"{"method":"tools/call","id":5,"params":{"name":"scene_tools.get_scene_info","parameters":{}}}"#)
        .await;
    let info = embedded(&info).result.unwrap();
    assert_eq!(info["objectCount"], 2);
    assert_eq!(info["currentLayer"], "Furniture");

    let cleared = stack
        .call(r#"{"method":"tools/call","id":6,"params":{"name":"scene_tools.clear_scene","parameters":{"currentLayerOnly":true}}}"#)
        .await;
    assert_eq!(embedded(&cleared).result.unwrap()["deletedCount"], 2);

    let bad = stack
        .call(r#"{"method":"tools/call","id":7,"params":{"name":"geometry_tools.create_box","parameters":{"cornerX":0,"cornerY":0,"cornerZ":0,"width":1,"depth":1}}}"#)
        .await;
    assert_eq!(
        embedded(&bad).error.as_deref(),
        Some("invalid parameters: missing required parameter 'height'")
    );
}

#[tokio::test]
async fn concurrent_relay_calls_get_their_own_results() {
    let (addr, _shutdown) = start_server(MemoryDocumentHost::new()).await;
    let relay = RelayClient::new(addr);

    let a = relay.invoke(
        "scene_tools.create_layer",
        json!({"name": "A"}),
    );
    let b = relay.invoke(
        "geometry_tools.create_box",
        json!({"cornerX": 0, "cornerY": 0, "cornerZ": 0, "width": 1, "depth": 2, "height": 3}),
    );
    let (a, b) = tokio::join!(a, b);

    assert_eq!(a.result.unwrap()["layerName"], "A");
    let b = b.result.unwrap();
    assert_eq!(b["type"], "box");
    assert_eq!(b["bbox"]["max"], json!({"x": 1.0, "y": 2.0, "z": 3.0}));
}

#[tokio::test]
async fn relay_to_dead_port_returns_promptly() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let start = Instant::now();
    let result = RelayClient::new(addr)
        .invoke("scene_tools.get_scene_info", json!({}))
        .await;

    assert!(start.elapsed() <= rhinomcp_server::mcp::bridge::CONNECT_TIMEOUT);
    assert!(!result.success);
    assert!(result.error.is_some());
}
