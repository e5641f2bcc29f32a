#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use trainerdeck_api_client::ApiClient;
use trainerdeck_console::{StreamSession, StreamTiming};
use trainerdeck_core::console::{ConsoleBuffer, ConsoleSink};

/// Serve `router` on an ephemeral local port and return a client for it.
pub async fn serve(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test backend");
    });
    ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("build client")
}

/// A client whose backend is not listening.
pub async fn unreachable_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).expect("build client")
}

pub struct Console {
    pub session: Arc<StreamSession<ApiClient>>,
    pub sink: Arc<dyn ConsoleSink>,
    pub buffer: ConsoleBuffer,
}

/// Stream session over `api` with short pauses, writing into a buffer.
pub fn console(api: &ApiClient) -> Console {
    let buffer = ConsoleBuffer::new();
    let sink: Arc<dyn ConsoleSink> = Arc::new(buffer.clone());
    let timing = StreamTiming {
        reconnect_delay: Duration::from_millis(50),
        reopen_delay: Duration::from_millis(100),
    };
    let session = StreamSession::new(Arc::new(api.clone()), Arc::clone(&sink), timing);
    Console {
        session: Arc::new(session),
        sink,
        buffer,
    }
}

/// Poll the buffer until it contains `needle` or five seconds pass.
pub async fn wait_for(buffer: &ConsoleBuffer, needle: &str) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if buffer.contents().contains(needle) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
