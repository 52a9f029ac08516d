//! Dev server command implementation with live reload.
//!
//! Two listeners run side by side: one serves the static-assets directory,
//! the other accepts websocket clients and pushes `refresh` to them whenever
//! the assets or the page template change. Nothing is rebuilt.

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use inkpress_core::BuildDirectories;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// The only message ever sent to live-reload clients
pub const REFRESH_MESSAGE: &str = "refresh";

/// How long to keep collecting events after the first one of a burst
const DEBOUNCE: Duration = Duration::from_millis(100);

type WatchEvents = mpsc::UnboundedReceiver<notify::Result<Event>>;

/// Fan-out point for refresh notifications.
///
/// Each connected client holds a receiver; dropping it on disconnect
/// removes the client. Messages are not retained, so a client that
/// connects after a change never sees it.
#[derive(Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<&'static str>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<&'static str> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send `refresh` to every connected client, returning how many were reached
    pub fn broadcast(&self) -> usize {
        self.tx.send(REFRESH_MESSAGE).unwrap_or(0)
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The files whose changes refresh connected clients.
///
/// Paths are canonical so they compare equal to the paths the watcher
/// reports.
#[derive(Debug, Clone)]
struct WatchScope {
    static_assets: PathBuf,
    template: PathBuf,
}

impl WatchScope {
    fn resolve(dirs: &BuildDirectories) -> Result<Self> {
        let canonical = |path: &Path| {
            std::fs::canonicalize(path).with_context(|| format!("Failed to resolve {:?}", path))
        };
        Ok(Self {
            static_assets: canonical(&dirs.static_assets)?,
            template: canonical(&dirs.template)?,
        })
    }

    fn covers(&self, path: &Path) -> bool {
        path == self.template || path.starts_with(&self.static_assets)
    }

    /// Whether `event` should refresh clients
    fn triggers_refresh(&self, event: &notify::Result<Event>) -> bool {
        is_change(event)
            && event
                .as_ref()
                .is_ok_and(|ev| ev.paths.iter().any(|path| self.covers(path)))
    }
}

/// Watch the assets tree and the template.
///
/// The template is watched through its directory: editors that save by
/// renaming a temp file over the original replace the inode, which ends a
/// watch placed on the file itself.
fn watch_sources(scope: &WatchScope) -> Result<(RecommendedWatcher, WatchEvents)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    watcher
        .watch(&scope.static_assets, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", scope.static_assets))?;

    if let Some(template_dir) = scope.template.parent() {
        if !template_dir.starts_with(&scope.static_assets) {
            watcher
                .watch(template_dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch {:?}", template_dir))?;
        }
    }

    Ok((watcher, rx))
}

/// Start development server with file watching
pub async fn dev_server(
    config_path: Option<&Path>,
    port: Option<u16>,
    reload_port: Option<u16>,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let dirs = config.directories();
    let port = port.unwrap_or(config.dev.port);
    let reload_port = reload_port.unwrap_or(config.dev.reload_port);

    let hub = ReloadHub::new();

    // The watcher must outlive the servers.
    let scope = WatchScope::resolve(&dirs)?;
    let (_watcher, rx) = watch_sources(&scope)?;
    tokio::spawn(relay_changes(rx, hub.clone(), scope));

    let static_app = Router::new()
        .fallback_service(ServeDir::new(&dirs.static_assets))
        .layer(TraceLayer::new_for_http());
    let reload_app = reload_router(hub);

    let static_addr = format!("127.0.0.1:{}", port);
    let reload_addr = format!("127.0.0.1:{}", reload_port);
    let static_listener = TcpListener::bind(&static_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", static_addr))?;
    let reload_listener = TcpListener::bind(&reload_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", reload_addr))?;

    tracing::info!("Serving {:?} on http://{}", dirs.static_assets, static_addr);
    tracing::info!("Live reload on ws://{}", reload_addr);
    println!("\n🚀 Serving at http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    tokio::try_join!(
        async {
            axum::serve(static_listener, static_app)
                .await
                .context("Static server error")
        },
        async {
            axum::serve(reload_listener, reload_app)
                .await
                .context("Live reload server error")
        },
    )?;

    Ok(())
}

fn reload_router(hub: ReloadHub) -> Router {
    Router::new().route("/", get(reload_socket)).with_state(hub)
}

/// Forward watcher events to the hub, one broadcast per burst
async fn relay_changes(mut rx: WatchEvents, hub: ReloadHub, scope: WatchScope) {
    while let Some(first) = rx.recv().await {
        let mut changed = scope.triggers_refresh(&first);

        // A single save usually arrives as several events
        tokio::time::sleep(DEBOUNCE).await;
        while let Ok(next) = rx.try_recv() {
            changed |= scope.triggers_refresh(&next);
        }

        if changed {
            let reached = hub.broadcast();
            tracing::info!("Change detected, refreshed {} client(s)", reached);
        }
    }
}

/// Only content changes count; reads (which serving files triggers) do not.
fn is_change(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(ev) => matches!(
            ev.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(err) => {
            tracing::warn!("Watcher error: {}", err);
            false
        }
    }
}

async fn reload_socket(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> Response {
    ws.on_upgrade(move |socket| handle_client(socket, hub))
}

async fn handle_client(mut socket: WebSocket, hub: ReloadHub) {
    let mut updates = hub.subscribe();
    tracing::info!("Live-reload client connected ({} total)", hub.client_count());

    loop {
        tokio::select! {
            recv = updates.recv() => {
                match recv {
                    Ok(msg) => {
                        if socket.send(Message::Text(msg.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    drop(updates);
    tracing::info!(
        "Live-reload client disconnected ({} remaining)",
        hub.client_count()
    );
}
