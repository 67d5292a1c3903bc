// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop for the catalog server.
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
/// When `shutdown` resolves the listener is dropped; connections already being
/// served finish in the background.
pub async fn run_server<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                break;
            }
        }
    }

    drop(listener);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, FileBackend};
    use crate::config::Config;
    use crate::server::bind_listener;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn send(addr: SocketAddr, request: String) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn request(method: &str, target: &str, body: &str) -> String {
        format!(
            "{method} {target} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_serves_catalog_over_tcp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("products.txt");
        std::fs::write(&path, "laptop, 999.99\n").unwrap();

        let mut config = Config::load_from(temp.path().join("none").to_str().unwrap()).unwrap();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(&config, Catalog::new(FileBackend::new(&path))));

        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(run_server(listener, state, async {
                    let _ = stop_rx.await;
                    "test shutdown"
                }));

                let response = send(addr, request("POST", "/", r#"{"name":"Mouse","price":20}"#)).await;
                assert!(response.starts_with("HTTP/1.1 201"), "{response}");
                assert!(response
                    .to_lowercase()
                    .contains("access-control-allow-origin: *"));

                let response = send(addr, request("GET", "/", "")).await;
                assert!(response.starts_with("HTTP/1.1 200"), "{response}");
                assert!(response.ends_with(
                    r#"[{"name":"laptop","price":999.99},{"name":"Mouse","price":20}]"#
                ));

                let response = send(addr, request("DELETE", "/?name=mouse&price=20", "")).await;
                assert!(response.starts_with("HTTP/1.1 200"), "{response}");

                let response = send(addr, request("PUT", "/", "")).await;
                assert!(response.starts_with("HTTP/1.1 405"), "{response}");

                stop_tx.send(()).unwrap();
                server.await.unwrap().unwrap();
            })
            .await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "laptop, 999.99\n");
    }
}
