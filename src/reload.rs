//! Live reload over WebSocket.
//!
//! Pages served by the dev server get a small client script that connects to
//! `ws://<host>:<reload_port>/`. After a watched task finishes the server
//! broadcasts one text frame:
//!
//! | Message  | Sent after   | Client reaction                  |
//! |----------|--------------|----------------------------------|
//! | `css`    | style run    | re-fetch every stylesheet link   |
//! | `reload` | content run  | `location.reload()`              |

use crate::log;
use anyhow::{Context, Result};
use std::{
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{Arc, Mutex, PoisonError},
    thread,
};
use tungstenite::{Message, WebSocket};

/// Client script template; `{port}` is replaced with the reload port.
const CLIENT_SCRIPT: &str = include_str!("embed/serve/reload.js");

/// What connected browsers should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    Css,
    Reload,
}

impl ReloadMessage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Reload => "reload",
        }
    }
}

/// Connected live-reload clients.
#[derive(Default)]
pub struct ReloadHub {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
}

impl ReloadHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bind `addr` and accept clients on a background thread.
    ///
    /// Returns the bound address (useful when `addr` asks for port 0).
    pub fn listen(self: &Arc<Self>, addr: SocketAddr) -> Result<SocketAddr> {
        let listener = TcpListener::bind(addr)
            .with_context(|| format!("Failed to bind live reload listener on {addr}"))?;
        let local = listener.local_addr()?;

        let hub = Arc::clone(self);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let hub = Arc::clone(&hub);
                thread::spawn(move || match tungstenite::accept(stream) {
                    Ok(ws) => hub.lock().push(ws),
                    Err(e) => log!("reload"; "handshake failed: {e}"),
                });
            }
        });

        Ok(local)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.lock().len()
    }

    /// Send `message` to every client, dropping the ones that went away.
    pub fn broadcast(&self, message: ReloadMessage) {
        let mut clients = self.lock();
        clients.retain_mut(|ws| ws.send(Message::text(message.as_str())).is_ok());
        if !clients.is_empty() {
            log!("reload"; "{} → {} client(s)", message.as_str(), clients.len());
        }
    }
}

/// `<script>` element connecting back to the reload port.
pub fn client_script(port: u16) -> String {
    format!(
        "<script>\n{}</script>\n",
        CLIENT_SCRIPT.replace("{port}", &port.to_string())
    )
}

/// Insert `script` before the last `</body>`, or append it if there is none.
pub fn inject_script(html: &str, script: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..at]);
            out.push_str(script);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{script}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_inject_before_body_close() {
        let html = "<html><body><p>Hi</p></BODY></html>";
        let out = inject_script(html, "<script>x</script>");
        assert_eq!(out, "<html><body><p>Hi</p><script>x</script></BODY></html>");
    }

    #[test]
    fn test_inject_without_body() {
        assert_eq!(inject_script("<p>Hi</p>", "<s/>"), "<p>Hi</p><s/>");
    }

    #[test]
    fn test_client_script_port() {
        let script = client_script(35729);
        assert!(script.starts_with("<script>"));
        assert!(script.contains("35729"));
        assert!(!script.contains("{port}"));
    }

    #[test]
    fn test_broadcast_reaches_client() {
        let hub = ReloadHub::new();
        let addr = hub.listen("127.0.0.1:0".parse().unwrap()).unwrap();

        let (mut client, _) = tungstenite::connect(format!("ws://{addr}/")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.client_count() == 0 {
            assert!(Instant::now() < deadline, "client never registered");
            thread::sleep(Duration::from_millis(10));
        }

        hub.broadcast(ReloadMessage::Css);
        hub.broadcast(ReloadMessage::Reload);

        assert_eq!(client.read().unwrap().into_text().unwrap().as_str(), "css");
        assert_eq!(client.read().unwrap().into_text().unwrap().as_str(), "reload");
    }
}
