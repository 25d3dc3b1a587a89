//! Shared test helpers: a minimal loopback HTTP server for orchestrator
//! integration tests that need real fetches without reaching the network.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawn a loopback HTTP/1.1 server that answers every request with a fixed
/// 200 OK response carrying `body`. Returns the server's base URL
/// (`http://127.0.0.1:<port>`). The accept loop runs for the remainder of
/// the test process; each test binds its own ephemeral port so tests don't
/// collide.
pub async fn spawn_fixed_response_server(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener has a local addr");

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                // We don't route on the request; every path gets the same body.
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Spawn a loopback HTTP/1.1 server where requests to `redirect_from` get a
/// 302 to `redirect_to`, and every other path (including `redirect_to`)
/// gets a fixed 200 OK response carrying `body`. Used to exercise the HTTP
/// engine's trainer, which records a synthesized page whenever a response's
/// final URL differs from the one requested.
pub async fn spawn_redirecting_server(
    redirect_from: &'static str,
    redirect_to: &'static str,
    body: &'static str,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener has a local addr");
    let base = format!("http://{}", addr);
    let redirect_target = format!("{}{}", base, redirect_to);

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            let redirect_from = redirect_from;
            let redirect_target = redirect_target.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request_line = String::from_utf8_lossy(&buf[..n]);
                let requested_path = request_line
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/");

                let response = if requested_path == redirect_from {
                    format!(
                        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        redirect_target
                    )
                } else {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    base
}
