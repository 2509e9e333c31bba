use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::category::Filter;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::graph::{GraphOptions, render_png};
use crate::report::{ReportView, caption};
use crate::session::ReportSession;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub struct AppState {
    session: Mutex<ReportSession>,
}

impl AppState {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            session: Mutex::new(ReportSession::new(config)),
        }
    }

    fn session(&self) -> MutexGuard<'_, ReportSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Deserialize)]
struct FilterQuery {
    filtro: Option<String>,
}

impl FilterQuery {
    fn filter(&self) -> Result<Filter> {
        self.filtro.as_deref().unwrap_or_default().parse()
    }
}

#[derive(Serialize)]
struct ReportResponse {
    status: String,
    file: String,
    caption: String,
    options: Vec<Filter>,
    #[serde(flatten)]
    view: ReportView,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_columns: Option<Vec<String>>,
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReportError::Parse(_) | ReportError::UnknownFilter(_) => StatusCode::BAD_REQUEST,
            ReportError::MissingColumns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReportError::NotLoaded => StatusCode::CONFLICT,
            ReportError::Export(_)
            | ReportError::Chart(_)
            | ReportError::Config(_)
            | ReportError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            available_columns: self.available_columns().map(<[String]>::to_vec),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/api/upload", post(upload))
        .route("/api/report", get(report))
        .route("/api/chart", get(chart))
        .route("/api/export", get(export))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn run(config: ReportConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let address = config.bind_address.clone();
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

fn respond(session: &ReportSession, view: ReportView) -> Response {
    let file = session
        .current()
        .map(|upload| upload.name.clone())
        .unwrap_or_default();
    Json(ReportResponse {
        status: "ok".to_string(),
        caption: caption(&file),
        file,
        options: Filter::options(),
        view,
    })
    .into_response()
}

async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut received: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ReportError::Parse(e.to_string()).into_response(),
        };
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.csv").to_string();
        match field.bytes().await {
            Ok(bytes) => received = Some((name, bytes.to_vec())),
            Err(e) => return ReportError::Parse(e.to_string()).into_response(),
        }
    }

    let Some((name, bytes)) = received else {
        warn!("Upload without a file field");
        return ReportError::Parse("No file data received".to_string()).into_response();
    };

    let mut session = state.session();
    match session.run(&name, &bytes, Filter::All) {
        Ok(view) => respond(&session, view),
        Err(e) => e.into_response(),
    }
}

async fn report(Query(query): Query<FilterQuery>, State(state): State<Arc<AppState>>) -> Response {
    let session = state.session();
    match query.filter().and_then(|filter| session.render(filter)) {
        Ok(view) => respond(&session, view),
        Err(e) => e.into_response(),
    }
}

async fn chart(Query(query): Query<FilterQuery>, State(state): State<Arc<AppState>>) -> Response {
    let rendered = {
        let session = state.session();
        let options = GraphOptions {
            width: session.config().chart_width,
            height: session.config().chart_height,
        };
        query
            .filter()
            .and_then(|filter| session.render(filter))
            .map(|view| (view.chart, options))
    };

    match rendered {
        Ok((Some(spec), options)) => match render_png(&spec, &options) {
            Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
            Err(e) => e.into_response(),
        },
        Ok((None, _)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn export(Query(query): Query<FilterQuery>, State(state): State<Arc<AppState>>) -> Response {
    let file = {
        let session = state.session();
        query
            .filter()
            .and_then(|filter| session.render(filter))
            .and_then(|view| view.export())
    };

    match file {
        Ok(file) => {
            let disposition = format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                ascii_filename(&file.filename),
                urlencoding::encode(&file.filename)
            );
            (
                [
                    (header::CONTENT_TYPE, file.mime.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

// Plain filename parameter for clients that ignore filename*
fn ascii_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect()
}
