//! Integration tests for the session server and client
//!
//! These tests run a real server on an ephemeral loopback port and talk to it
//! through the client crate or raw UDP sockets.

use client::{Client, ClientConfig, ClientError};
use server::{Server, ServerConfig, ServerHandle, ServerState};
use shared::{
    decode_response, encode_request, ActionCode, LoginRequest, Request, Response, SessionId,
    ShutdownRequest, PACKAGE_LIMIT,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

const STOP_TIMEOUT: Duration = Duration::from_secs(3);

async fn start_server() -> ServerHandle {
    start_server_with(ServerConfig::with_addr("127.0.0.1:0")).await
}

async fn start_server_with(config: ServerConfig) -> ServerHandle {
    Server::start(config).await.expect("Failed to start server")
}

async fn connect(handle: &ServerHandle) -> Client {
    let config = ClientConfig {
        timeout: Duration::from_millis(500),
    };
    Client::connect_with(&handle.local_addr().to_string(), config)
        .await
        .expect("Failed to connect client")
}

async fn stop_and_join(handle: &ServerHandle) {
    handle.stop();
    timeout(STOP_TIMEOUT, handle.join())
        .await
        .expect("Server did not stop in time");
}

/// WIRE PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Sends a hand-encoded datagram and decodes the raw reply
    #[tokio::test]
    async fn raw_datagram_login() {
        let handle = start_server().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let request = Request::from(LoginRequest::new("raw", "pw"));
        let data = encode_request(&request).unwrap();
        socket.send_to(&data, handle.local_addr()).await.unwrap();

        let mut buf = vec![0u8; PACKAGE_LIMIT];
        let (len, from) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("No response from server")
            .unwrap();
        assert_eq!(from, handle.local_addr());

        match decode_response(&buf[..len], ActionCode::Login).unwrap() {
            Response::Login(ack) => {
                assert!(ack.header.is_ok);
                assert_eq!(ack.welcome, "Welcome raw");
            }
            other => panic!("Unexpected response: {:?}", other),
        }

        stop_and_join(&handle).await;
    }

    /// Garbage datagrams get no reply and do not disturb the server
    #[tokio::test]
    async fn garbage_is_ignored() {
        let handle = start_server().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        for garbage in [&b""[..], &b"hello"[..], &[0xff; 64][..]] {
            socket.send_to(garbage, handle.local_addr()).await.unwrap();
        }

        let mut buf = vec![0u8; PACKAGE_LIMIT];
        let reply = timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
        assert!(reply.is_err(), "Server answered a malformed datagram");
        assert_eq!(handle.state(), ServerState::Listening);

        let mut client = connect(&handle).await;
        assert_ok!(client.request(LoginRequest::new("alice", "pw")).await);

        stop_and_join(&handle).await;
    }
}

/// SESSION LIFECYCLE TESTS
mod session_tests {
    use super::*;

    /// Login as alice, then shut the server down with the issued session
    #[tokio::test]
    async fn login_then_shutdown() {
        let handle = start_server().await;
        let mut client = connect(&handle).await;

        let response = assert_ok!(client.request(LoginRequest::new("alice", "pw")).await);
        let session_id = match response {
            Response::Login(ack) => {
                assert_eq!(ack.header.action, ActionCode::Login);
                assert!(ack.header.is_ok);
                assert_eq!(ack.welcome, "Welcome alice");
                ack.header.session_id
            }
            other => panic!("Unexpected response: {:?}", other),
        };
        assert!(!session_id.is_empty());
        assert_eq!(client.session_id(), &session_id);
        assert!(handle.sessions().has(&session_id));

        let response = assert_ok!(client.request(ShutdownRequest::new()).await);
        assert_eq!(response.action(), ActionCode::Shutdown);
        assert!(response.is_ok());

        timeout(STOP_TIMEOUT, handle.join())
            .await
            .expect("Server did not stop after shutdown");
        assert_eq!(handle.state(), ServerState::Stopped);
    }

    /// Shutdown without a known session is rejected and the server keeps running
    #[tokio::test]
    async fn shutdown_with_unknown_session_is_rejected() {
        let handle = start_server().await;
        let mut client = connect(&handle).await;

        let error = assert_err!(client.request(ShutdownRequest::new()).await);
        match error {
            ClientError::Rejected(message) => assert_eq!(message, "invalid session id"),
            other => panic!("Unexpected error: {:?}", other),
        }

        // A forged id sent over a raw socket is rejected too
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut forged = Request::from(ShutdownRequest::new());
        forged.set_session_id(SessionId::generate());
        socket
            .send_to(&encode_request(&forged).unwrap(), handle.local_addr())
            .await
            .unwrap();
        let mut buf = vec![0u8; PACKAGE_LIMIT];
        let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let response = decode_response(&buf[..len], ActionCode::Shutdown).unwrap();
        assert!(!response.is_ok());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), ServerState::Listening);
        assert_ok!(client.request(LoginRequest::new("bob", "pw")).await);

        stop_and_join(&handle).await;
    }

    /// Retrying a shutdown with an id the server never issued stays rejected
    #[tokio::test]
    async fn repeated_forged_shutdown_never_stops_server() {
        let handle = start_server().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut forged = Request::from(ShutdownRequest::new());
        forged.set_session_id(SessionId::new("never-issued"));
        let data = encode_request(&forged).unwrap();

        for _ in 0..3 {
            socket.send_to(&data, handle.local_addr()).await.unwrap();
            let mut buf = vec![0u8; PACKAGE_LIMIT];
            let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
                .await
                .expect("No response from server")
                .unwrap();
            let response = decode_response(&buf[..len], ActionCode::Shutdown).unwrap();
            assert!(!response.is_ok());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), ServerState::Listening);
        assert!(handle.sessions().is_empty());

        stop_and_join(&handle).await;
    }

    /// Once stopped, the server no longer answers
    #[tokio::test]
    async fn stopped_server_is_unreachable() {
        let handle = start_server().await;
        let mut client = connect(&handle).await;
        assert_ok!(client.request(LoginRequest::new("alice", "pw")).await);

        assert_ok!(client.request(ShutdownRequest::new()).await);
        timeout(STOP_TIMEOUT, handle.join()).await.unwrap();

        let result = client.request(LoginRequest::new("alice", "pw")).await;
        assert!(result.is_err());
    }

    /// stop() racing with a client shutdown never double-stops
    #[tokio::test]
    async fn stop_races_with_shutdown_request() {
        let handle = start_server().await;
        let mut client = connect(&handle).await;
        assert_ok!(client.request(LoginRequest::new("alice", "pw")).await);

        let stoppers: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.stop() })
            })
            .collect();
        // The shutdown may or may not be answered depending on who wins
        let _ = client.request(ShutdownRequest::new()).await;

        let mut initiated = 0;
        for stopper in stoppers {
            if stopper.await.unwrap() {
                initiated += 1;
            }
        }
        assert!(initiated <= 1);

        timeout(STOP_TIMEOUT, handle.join()).await.unwrap();
        assert!(!handle.stop());
        assert_eq!(handle.state(), ServerState::Stopped);
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;

    /// Concurrent logins from independent clients each get a distinct session
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_logins_get_distinct_sessions() {
        let handle = start_server().await;
        let clients = 32;

        let tasks: Vec<_> = (0..clients)
            .map(|i| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    let mut client = connect(&handle).await;
                    let account = format!("user-{}", i);
                    match client.request(LoginRequest::new(account.clone(), "pw")).await {
                        Ok(Response::Login(ack)) => {
                            assert_eq!(ack.welcome, format!("Welcome {}", account));
                            ack.header.session_id
                        }
                        other => panic!("Login failed: {:?}", other),
                    }
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }

        assert_eq!(ids.len(), clients);
        assert!(ids.iter().all(|id| handle.sessions().has(id)));
        assert_eq!(handle.sessions().len(), clients);

        stop_and_join(&handle).await;
    }

    /// A tight in-flight limit still serves every request
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn small_worker_pool_serves_all_requests() {
        let config = ServerConfig {
            max_in_flight: 1,
            channel_capacity: 1,
            ..ServerConfig::with_addr("127.0.0.1:0")
        };
        let handle = start_server_with(config).await;

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    let mut client = connect(&handle).await;
                    client
                        .request(LoginRequest::new(format!("user-{}", i), "pw"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(handle.sessions().len(), 8);

        stop_and_join(&handle).await;
    }
}
