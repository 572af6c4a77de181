//! Site server: static output, the subscription endpoint and live reload

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::subscribe::{self, Mailchimp, MailingList, SubscribeRequest};
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state
struct ServerState<L> {
    public_dir: PathBuf,
    mailing_list: L,
    upstream_error_message: String,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the site server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool) -> Result<()> {
    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        mailing_list: Mailchimp::new(blog.config.subscribe.clone()),
        upstream_error_message: blog.config.subscribe.upstream_error_message.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if watch {
        let base_dir = blog.base_dir.clone();
        let watched = vec![
            (blog.posts_dir.clone(), RecursiveMode::Recursive),
            (blog.static_dir.clone(), RecursiveMode::Recursive),
            (base_dir.join("_config.yml"), RecursiveMode::NonRecursive),
        ];

        // The debouncer hands events over a blocking channel
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_rebuild(&base_dir, watched, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router<L>(state: Arc<ServerState<L>>) -> Router
where
    L: MailingList + Send + Sync + 'static,
{
    Router::new()
        .route("/api/subscribe", post(subscribe_handler::<L>))
        .route("/__livereload", get(livereload_handler::<L>))
        .fallback(fallback_handler::<L>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch sources and rebuild the whole site on change
fn watch_and_rebuild(
    base_dir: &Path,
    watched: Vec<(PathBuf, RecursiveMode)>,
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for (path, mode) in watched {
        if path.exists() {
            debouncer.watcher().watch(&path, mode)?;
            tracing::debug!("Watching: {:?}", path);
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant_events: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant(&e.path))
                    .collect();

                if relevant_events.is_empty() {
                    continue;
                }

                println!();
                for event in &relevant_events {
                    println!("📝 File changed: {}", event.path.display());
                }

                // Config may have changed too, so start from scratch
                println!("\n🔄 Rebuilding...");
                match Blog::new(base_dir).and_then(|blog| blog.build()) {
                    Ok(_) => {
                        println!("✅ Rebuilt successfully!");
                        // Notify all connected clients to reload
                        let _ = reload_tx.send(());
                    }
                    Err(e) => {
                        println!("❌ Build failed: {}", e);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Editor and VCS noise does not trigger rebuilds
fn is_relevant(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

/// POST /api/subscribe
async fn subscribe_handler<L>(State(state): State<Arc<ServerState<L>>>, body: Bytes) -> Response
where
    L: MailingList + Send + Sync + 'static,
{
    let request = SubscribeRequest::from_body(&body);
    let (status, response) =
        subscribe::handle(&state.mailing_list, &request, &state.upstream_error_message).await;
    (status, Json(response)).into_response()
}

/// WebSocket handler for live reload
async fn livereload_handler<L>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState<L>>>,
) -> impl IntoResponse
where
    L: Send + Sync + 'static,
{
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve the generated site, with the live reload script in HTML when watching
async fn fallback_handler<L>(
    State(state): State<Arc<ServerState<L>>>,
    request: Request<Body>,
) -> Response
where
    L: Send + Sync + 'static,
{
    let not_found_page = state.public_dir.join("404.html");

    if state.live_reload {
        if let Some(file_path) = resolve_html(&state.public_dir, request.uri().path()) {
            return match tokio::fs::read_to_string(&file_path).await {
                Ok(content) => Html(inject_live_reload(&content)).into_response(),
                Err(_) => not_found_with_reload(&not_found_page).await,
            };
        }
    }

    let mut service = ServeDir::new(&state.public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(&not_found_page));
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// The HTML file a request path maps to, if it maps to one
fn resolve_html(public_dir: &Path, path: &str) -> Option<PathBuf> {
    let clean_path = path.trim_start_matches('/');
    if clean_path.split('/').any(|segment| segment == "..") {
        return None;
    }

    let candidate = public_dir.join(clean_path);
    let file_path = if clean_path.is_empty() || candidate.is_dir() {
        candidate.join("index.html")
    } else if candidate.exists() {
        candidate
    } else {
        // Try adding .html extension
        let with_html = public_dir.join(format!("{}.html", clean_path));
        if with_html.exists() {
            with_html
        } else {
            candidate
        }
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);
    // Unknown extensionless paths end up at the 404 page
    let is_missing_page = file_path.extension().is_none();

    (is_html || is_missing_page).then_some(file_path)
}

async fn not_found_with_reload(page: &Path) -> Response {
    match tokio::fs::read_to_string(page).await {
        Ok(content) => (StatusCode::NOT_FOUND, Html(inject_live_reload(&content))).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        // If no </body> tag, append to end
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}
