use crate::*;

#[test]
fn test_default_server_creation() {
    let server = create_server().expect("default configuration is valid");
    assert_eq!(server.config().bind_address.port(), 8080);
    assert_eq!(server.pass_key().len(), auth::PASS_KEY_LENGTH);
    assert_eq!(server.engine_manager().list(), vec![EngineFamily::Generic]);
}

#[test]
fn test_tls_without_material_is_fatal() {
    let config = ServerConfig {
        tls: TlsConfig {
            enabled: true,
            cert_path: None,
            key_path: None,
        },
        ..Default::default()
    };
    assert!(matches!(
        create_server_with_config(config),
        Err(ServerError::Tls(_))
    ));
}

#[tokio::test]
async fn test_serve_refuses_to_run_twice() {
    let server = create_server().unwrap();
    let state = ShutdownState::new();
    state.initiate_shutdown();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    server.serve(listener, state.clone()).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    assert!(matches!(
        server.serve(listener, state).await,
        Err(ServerError::Internal(_))
    ));
}

#[cfg(unix)]
mod end_to_end {
    use crate::test_support::{fake_engine, FakeEngine};
    use crate::*;
    use futures_util::{SinkExt, StreamExt};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio_tungstenite::{
        connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
    };

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const PASS_KEY: &str = "e2e-passkey";

    struct Harness {
        server: Arc<EngineServer>,
        shutdown: ShutdownState,
        url: String,
        _dir: tempfile::TempDir,
    }

    async fn start(localhost_bypass: bool, intelligence: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), FakeEngine::Responsive);

        let mut config = ServerConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            auth: AuthConfig {
                pass_key: Some(PASS_KEY.to_string()),
                localhost_bypass,
                ..Default::default()
            },
            engine: EngineConfig {
                path: engine,
                handshake_timeout_ms: 5_000,
                ..Default::default()
            },
            ..Default::default()
        };
        config.intelligence.enabled = intelligence;

        let server = Arc::new(create_server_with_config(config).unwrap());
        server.start_engine().await.unwrap();

        let listener = server.bind().await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let shutdown = ShutdownState::new();
        {
            let server = server.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { server.serve(listener, shutdown).await });
        }

        Harness {
            server,
            shutdown,
            url,
            _dir: dir,
        }
    }

    async fn connect(url: &str) -> Client {
        let (client, _) = connect_async(url).await.expect("connect");
        client
    }

    async fn send(client: &mut Client, line: &str) {
        client
            .send(Message::Text(line.to_string().into()))
            .await
            .expect("send");
    }

    async fn recv(client: &mut Client) -> String {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("reply in time")
                .expect("stream open")
                .expect("valid frame");
            if let Message::Text(text) = message {
                return text.as_str().to_string();
            }
        }
    }

    async fn request(client: &mut Client, line: &str) -> String {
        send(client, line).await;
        recv(client).await
    }

    async fn recv_until(client: &mut Client, prefix: &str) -> String {
        for _ in 0..50 {
            let line = recv(client).await;
            if line.starts_with(prefix) {
                return line;
            }
        }
        panic!("no line starting with {prefix}");
    }

    async fn stop(harness: Harness) {
        harness.shutdown.initiate_shutdown();
        harness.server.stop_engines().await;
    }

    #[tokio::test]
    async fn test_protocol_session() {
        let harness = start(false, false).await;
        let mut client = connect(&harness.url).await;

        assert_eq!(request(&mut client, "whoareyou").await, "iam chesshook-intermediaryv1");
        assert_eq!(request(&mut client, "whatengine").await, "engine FakeFish 1.0");
        assert_eq!(request(&mut client, "sub").await, "subok");
        assert_eq!(request(&mut client, "position startpos").await, "autherr");
        assert_eq!(request(&mut client, "auth wrong").await, "autherr");
        assert_eq!(request(&mut client, &format!("auth {PASS_KEY}")).await, "authok");

        send(&mut client, "position startpos moves e2e4").await;
        send(&mut client, "go depth 10").await;
        assert_eq!(recv_until(&mut client, "bestmove").await, "bestmove e2e4 ponder e7e5");

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_lock_released_on_disconnect() {
        let harness = start(true, false).await;
        let mut first = connect(&harness.url).await;
        let mut second = connect(&harness.url).await;

        assert_eq!(request(&mut first, "lock").await, "lockok");
        assert_eq!(request(&mut second, "lock").await, "lockerr");
        assert_eq!(request(&mut second, "go depth 1").await, "lockerr");

        first.close(None).await.unwrap();
        drop(first);

        let mut acquired = false;
        for _ in 0..50 {
            if request(&mut second, "lock").await == "lockok" {
                acquired = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(acquired, "lock was not released by the disconnect");

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_intelligence_summary_is_broadcast() {
        let harness = start(true, true).await;
        let mut client = connect(&harness.url).await;

        assert_eq!(request(&mut client, "sub").await, "subok");
        send(&mut client, "position startpos").await;
        send(&mut client, "go depth 10").await;

        assert_eq!(recv_until(&mut client, "bestmove").await, "bestmove e2e4 ponder e7e5");
        let summary = recv(&mut client).await;
        assert_eq!(
            summary,
            "info string intelligence bestmove e2e4 score 0.35 original 0.35"
        );

        stop(harness).await;
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let harness = start(true, false).await;
        let mut client = connect(&harness.url).await;

        client.send(Message::Ping(vec![1, 2, 3].into())).await.unwrap();
        let pong = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(pong, Message::Pong(data) if data.as_ref() == [1, 2, 3]));

        // The next frame is the reply, not a second Pong.
        send(&mut client, "whoareyou").await;
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(next, Message::Text(text) if text.as_str() == "iam chesshook-intermediaryv1"));

        stop(harness).await;
    }
}
