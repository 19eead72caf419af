use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::{RwLock, broadcast, mpsc};
use tower_http::services::ServeDir;

use crate::{
    ServeArgs,
    build::{
        BuildResult, FileWatcher, PageGenerator, PageStore, PageView, PathClassifier, WatchEvent,
        WatchPaths, base_path_from_config,
    },
    config::BlogConfig,
};

/// Route that browsers subscribe to for reload notifications.
const LIVE_RELOAD_ROUTE: &str = "/_blogsmith/live-reload";

/// What the server renders from. Replaced wholesale after each rebuild.
struct Site {
    store: PageStore,
    view: PageView,
}

#[derive(Clone)]
struct AppState {
    site: Arc<RwLock<Site>>,
    reload_tx: broadcast::Sender<()>,
}

/// SSE handler for live reload notifications.
async fn live_reload_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.reload_tx.subscribe();
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(_) => {
                    yield Ok(Event::default().event("reload").data("reload"));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed some messages, but that's fine - we just need the latest
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// `GET /blog`
async fn index_handler(State(state): State<AppState>) -> Response {
    let site = state.site.read().await;
    match site.view.render_index(&site.store) {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_failure("index", &e),
    }
}

/// `GET /blog/{slug}`. Only slugs from the last build exist.
async fn post_handler(State(state): State<AppState>, UrlPath(slug): UrlPath<String>) -> Response {
    let site = state.site.read().await;
    let Some(document) = site.store.get(&slug) else {
        tracing::debug!(slug = %slug, "unknown post");
        return (StatusCode::NOT_FOUND, Html("<h1>404</h1><p>Post not found.</p>")).into_response();
    };
    match site.view.render_page(document) {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_failure(&slug, &e),
    }
}

fn render_failure(page: &str, error: &dyn std::error::Error) -> Response {
    tracing::error!(page, error = %error, "render failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "render error").into_response()
}

/// Post routes render from the store; everything else comes from the output directory.
fn router(state: AppState, output_dir: &Path) -> Router {
    let serve_dir = ServeDir::new(output_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/blog", get(index_handler))
        .route("/blog/{slug}", get(post_handler))
        .route(LIVE_RELOAD_ROUTE, get(live_reload_handler))
        .with_state(state)
        .fallback_service(serve_dir)
}

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config_path = super::config_path(args.config_file.as_deref())?;
    let config = BlogConfig::load_from_arg(Some(config_path.as_path())).await?;
    let live_reload = args.watch && config.dev.live_reload;

    // Build the site first
    println!("Building site...");
    let (result, site) = build_site(&config_path, live_reload).await?;
    println!("Built {} post(s)", result.pages);

    let state = AppState {
        site: Arc::new(RwLock::new(site)),
        reload_tx: broadcast::channel::<()>(16).0,
    };

    if args.watch {
        watch(&config, &config_path, live_reload, state.clone());
    }

    let app = router(state, &result.output_dir);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}/blog", display_host, args.port);

    println!("\nServing blog at {}", url);
    println!("Press Ctrl+C to stop\n");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        eprintln!("Failed to open browser: {}", e);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the site and load what the server needs from the written props.
async fn build_site(config_path: &Path, live_reload: bool) -> Result<(BuildResult, Site), anyhow::Error> {
    let config = BlogConfig::load_from_arg(Some(config_path)).await?;
    let generator = PageGenerator::new(config, base_path_from_config(config_path))
        .with_live_reload(live_reload);
    let result = generator.generate().await?;
    let site = Site {
        store: PageStore::load(&result.output_dir).await?,
        view: generator.page_view()?,
    };
    Ok((result, site))
}

/// Rebuild on changes and swap the served site.
fn watch(config: &BlogConfig, config_path: &Path, live_reload: bool, state: AppState) {
    let base_path = base_path_from_config(config_path);
    let generator = PageGenerator::new(config.clone(), base_path);
    let paths = WatchPaths {
        content_dir: canonical(generator.content_dir()),
        theme_dir: generator.theme_dir().map(canonical),
        config_path: canonical(config_path.to_path_buf()),
    };
    let classifier = PathClassifier::new(paths, config.content.extensions.clone());

    let watcher = match FileWatcher::new(&config.dev.watch, classifier) {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("Warning: Failed to start file watcher: {}", e);
            return;
        }
    };
    println!("Watching for changes...");

    // The watcher delivers on a std channel; forward onto the runtime
    let (tx, mut rx) = mpsc::channel::<WatchEvent>(16);
    tokio::task::spawn_blocking(move || {
        while let Some(event) = watcher.recv() {
            if tx.blocking_send(event).is_err() {
                break;
            }
        }
    });

    let config_path = config_path.to_path_buf();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                WatchEvent::FilesChanged(changes) => {
                    tracing::debug!(?changes, "files changed");
                    println!("\nDetected {} change(s), rebuilding...", changes.len());
                    match build_site(&config_path, live_reload).await {
                        Ok((result, site)) => {
                            *state.site.write().await = site;
                            println!("Rebuilt {} post(s)", result.pages);
                            // Notify connected browsers to reload
                            let _ = state.reload_tx.send(());
                        }
                        Err(e) => eprintln!("Build error: {:#}", e),
                    }
                }
                WatchEvent::Error(e) => {
                    eprintln!("Watch error: {}", e);
                }
            }
        }
    });
}

/// Canonicalize a path to ensure consistent matching with file events.
fn canonical(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn built_site(posts: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("blogsmith.yaml");
        std::fs::write(&config_path, "site:\n  name: Test Blog\n").unwrap();
        std::fs::create_dir(dir.path().join("posts")).unwrap();
        for (name, body) in posts {
            std::fs::write(dir.path().join("posts").join(name), body).unwrap();
        }

        let (result, site) = build_site(&config_path, false).await.unwrap();
        let state = AppState {
            site: Arc::new(RwLock::new(site)),
            reload_tx: broadcast::channel::<()>(16).0,
        };
        (dir, result.output_dir, state)
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_known_slug_renders() {
        let (_dir, output, state) = built_site(&[("hello.md", "# Hello\n")]).await;
        let app = router(state, &output);

        assert_eq!(get_status(app.clone(), "/blog/hello").await, StatusCode::OK);
        assert_eq!(get_status(app.clone(), "/blog").await, StatusCode::OK);
        assert_eq!(get_status(app, "/styles.css").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let (_dir, output, state) = built_site(&[("hello.md", "# Hello\n")]).await;
        let app = router(state, &output);

        assert_eq!(get_status(app.clone(), "/blog/nope").await, StatusCode::NOT_FOUND);
        assert_eq!(get_status(app, "/blog/nope/").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_removed_post_is_not_found_after_rebuild() {
        let (dir, output, state) = built_site(&[("old.md", "old\n")]).await;
        std::fs::remove_file(dir.path().join("posts/old.md")).unwrap();
        std::fs::write(dir.path().join("posts/new.md"), "new\n").unwrap();

        let (_, site) = build_site(&dir.path().join("blogsmith.yaml"), false).await.unwrap();
        *state.site.write().await = site;
        let app = router(state, &output);

        assert_eq!(get_status(app.clone(), "/blog/old").await, StatusCode::NOT_FOUND);
        assert_eq!(get_status(app.clone(), "/blog/old/").await, StatusCode::NOT_FOUND);
        assert_eq!(get_status(app, "/blog/new").await, StatusCode::OK);
    }
}
