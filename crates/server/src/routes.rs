//! HTTP routes for canvas operations
//!
//! ```text
//! POST   {base}/?width=W&height=H              -> 201, body: id
//! GET    {base}/{id}/?x=X&y=Y&width=W&height=H -> 200, body: encoded image
//! POST   {base}/{id}/?x=X&y=Y&width=W&height=H -> 200 (body: encoded image)
//! DELETE {base}/{id}                           -> 200
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chartas_canvas::{CanvasError, CanvasId, CanvasStore};
use chartas_config::{ImageFormatKind, ServerConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    store: Arc<CanvasStore>,
    format: ImageFormatKind,
}

impl AppState {
    pub fn new(store: Arc<CanvasStore>, format: ImageFormatKind) -> Self {
        Self { store, format }
    }
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    width: i64,
    height: i64,
}

#[derive(Debug, Deserialize)]
struct RegionParams {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

/// Build the router, mounted at `config.request_path`
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let base = config.request_path.trim_end_matches('/');
    let create_paths = if base.is_empty() {
        vec!["/".to_string()]
    } else {
        vec![base.to_string(), format!("{}/", base)]
    };

    let mut router = Router::new();
    for path in create_paths {
        router = router.route(&path, post(create_image));
    }
    for path in [format!("{}/:id", base), format!("{}/:id/", base)] {
        router = router.route(
            &path,
            get(get_sub_image).post(draw_image).delete(delete_image),
        );
    }

    router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run a store operation on the blocking pool; the store does synchronous I/O
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&CanvasStore) -> Result<T, CanvasError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
}

async fn create_image(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let id = run_blocking(&state, move |store| {
        store.create_image(params.width, params.height)
    })
    .await?;
    Ok((StatusCode::CREATED, id.to_string()))
}

async fn get_sub_image(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Query(r): Query<RegionParams>,
) -> Result<Response, ApiError> {
    let bytes = run_blocking(&state, move |store| {
        store.get_sub_image(id, r.x, r.y, r.width, r.height)
    })
    .await?;
    Ok(([(header::CONTENT_TYPE, state.format.content_type())], bytes).into_response())
}

async fn draw_image(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
    Query(r): Query<RegionParams>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    run_blocking(&state, move |store| {
        store.draw_image(id, r.x, r.y, r.width, r.height, &body)
    })
    .await?;
    Ok(StatusCode::OK)
}

async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<CanvasId>,
) -> Result<StatusCode, ApiError> {
    run_blocking(&state, move |store| store.delete_image(id)).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chartas_canvas::{ImageCodec, MemoryTileStore, Raster, RasterCodec};
    use chartas_config::TileConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = CanvasStore::new(
            MemoryTileStore::new(),
            ImageCodec::default(),
            TileConfig::new(540, 10),
        )
        .unwrap();
        let state = AppState::new(Arc::new(store), ImageFormatKind::Bmp);
        router(state, &ServerConfig::default())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn create(app: &Router, width: i64, height: i64) -> (StatusCode, Vec<u8>) {
        let uri = format!("/chartas/?width={}&height={}", width, height);
        send(app, Method::POST, &uri, Vec::new()).await
    }

    #[tokio::test]
    async fn test_create() {
        let app = app();
        let (status, body) = create(&app, 540, 540).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, b"0");

        let (status, body) = create(&app, 10, 10).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, b"1");
    }

    #[tokio::test]
    async fn test_create_bad_size() {
        let app = app();
        let (status, _) = create(&app, 0, 10).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, "/chartas/?width=10", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete() {
        let app = app();
        create(&app, 20, 20).await;

        let (status, _) = send(&app, Method::DELETE, "/chartas/0", Vec::new()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, "/chartas/0", Vec::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/chartas/abc", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_empty_sub_image() {
        let app = app();
        create(&app, 20, 20).await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/chartas/0/?x=0&y=0&width=5&height=4",
            Vec::new(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ImageCodec::default().decode(&body).unwrap(), Raster::new(5, 4));
    }

    #[tokio::test]
    async fn test_get_errors() {
        let app = app();
        create(&app, 20, 20).await;

        let (status, _) = send(&app, Method::GET, "/chartas/1/?x=0&y=0&width=5&height=4", Vec::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/chartas/0/?x=-100&y=0&width=5&height=4", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/chartas/0/?x=0&y=0&width=5", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/chartas/0/?x=0&y=0&width=4294967295&height=4294967295", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/chartas/0/?x={}&y=0&width=3&height=2", i64::MIN);
        let (status, _) = send(&app, Method::GET, &uri, Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, Method::DELETE, "/chartas/0", Vec::new()).await;
        let (status, _) = send(&app, Method::GET, "/chartas/0/?x=0&y=0&width=5&height=4", Vec::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_draw_then_get() {
        let app = app();
        create(&app, 540, 540).await;

        let codec = ImageCodec::default();
        let mut src = Raster::new(64, 48);
        for y in 0..48 {
            for x in 0..64 {
                src.set_pixel(x, y, [x as u8 * 3, y as u8 * 5, 99]);
            }
        }

        let (status, _) = send(
            &app,
            Method::POST,
            "/chartas/0/?x=10&y=10&width=64&height=48",
            codec.encode(&src).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::GET,
            "/chartas/0/?x=10&y=10&width=64&height=48",
            Vec::new(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(codec.decode(&body).unwrap(), src);
    }

    #[tokio::test]
    async fn test_draw_errors() {
        let app = app();
        create(&app, 7, 20).await;
        let bytes = ImageCodec::default().encode(&Raster::new(3, 2)).unwrap();

        let (status, _) = send(&app, Method::POST, "/chartas/5/?x=0&y=0&width=3&height=2", bytes.clone()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::POST, "/chartas/0/?x=100&y=100&width=3&height=2", bytes.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, "/chartas/0/?x=0&y=0&width=4&height=2", bytes).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, "/chartas/0/?x=0&y=0&width=3&height=2", b"nope".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_content_type() {
        let app = app();
        create(&app, 4, 4).await;

        let request = Request::builder()
            .uri("/chartas/0?x=0&y=0&width=2&height=2")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/bmp");
    }
}
