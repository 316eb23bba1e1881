use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    serve, Form, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::chat::{self, ChatTurn, EXAMPLE_QUESTIONS};
use crate::error::BotError;
use crate::mistral::MistralClient;
use crate::session::{SessionStore, ToolRun};
use crate::tools::{self, Tool, ToolOutcome};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    client: MistralClient,
    sessions: SessionStore,
    static_dir: PathBuf,
}

impl AppState {
    /// `assets_dir` holds `templates/` and `static/`.
    pub fn new(client: MistralClient, assets_dir: impl Into<PathBuf>) -> Self {
        let assets_dir = assets_dir.into();
        Self {
            templates: Arc::new(create_minijinja_env(assets_dir.join("templates"))),
            client,
            sessions: SessionStore::default(),
            static_dir: assets_dir.join("static"),
        }
    }

    /// Number of live browser sessions held in memory.
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        // Watch the templates directory for changes
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

#[derive(Deserialize)]
struct IndexParams {
    draft: Option<String>,
}

#[derive(Deserialize)]
struct ChatForm {
    message: String,
}

#[derive(Deserialize)]
struct ToolForm {
    input: String,
}

#[derive(Serialize)]
struct ToolPanel {
    slug: &'static str,
    title: &'static str,
    button: &'static str,
    input: String,
    outcome: Option<ToolOutcome>,
}

fn panel_labels(tool: Tool) -> (&'static str, &'static str) {
    match tool {
        Tool::Classify => ("Classification", "Run Classification"),
        Tool::Extract => ("JSON Extraction", "Extract JSON"),
        Tool::Email => ("Email Reply", "Generate Email"),
        Tool::Summarize => ("Summarization", "Summarize"),
    }
}

fn tool_panels(last_run: Option<ToolRun>) -> Vec<ToolPanel> {
    Tool::ALL
        .into_iter()
        .map(|tool| {
            let (title, button) = panel_labels(tool);
            let (input, outcome) = match &last_run {
                Some(run) if run.tool == tool => (run.input.clone(), Some(run.outcome.clone())),
                _ => (tool.default_input().to_string(), None),
            };
            ToolPanel {
                slug: tool.slug(),
                title,
                button,
                input,
                outcome,
            }
        })
        .collect()
}

fn with_cookie(cookie: Option<String>, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

async fn index_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<IndexParams>,
) -> Response {
    let (id, cookie) = state.sessions.resolve(&headers);
    // Reading never creates a session; only chat and tool posts do.
    let (turns, notice, tool_run): (Vec<ChatTurn>, _, _) = state
        .sessions
        .peek_session(id, |session| {
            (
                session.transcript.turns().to_vec(),
                session.notice.take(),
                session.tool_run.clone(),
            )
        })
        .await
        .unwrap_or_default();

    let missing_key = (!state.client.is_configured()).then(|| BotError::MissingApiKey.to_string());

    let rendered = state.templates.acquire_env().and_then(|env| {
        env.get_template("index.html").and_then(|tmpl| {
            tmpl.render(minijinja::context! {
                title => "Customer Support Chatbot",
                missing_key => missing_key,
                turns => turns,
                notice => notice,
                draft => params.draft.unwrap_or_default(),
                examples => EXAMPLE_QUESTIONS,
                tools => tool_panels(tool_run),
            })
        })
    });

    match rendered {
        Ok(html) => with_cookie(cookie, Html(html)),
        Err(e) => {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
                .into_response()
        }
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let (id, cookie) = state.sessions.resolve(&headers);
    let inquiry = form.message.trim();
    if inquiry.is_empty() {
        return with_cookie(cookie, Redirect::to("/"));
    }

    let result = chat::answer(&state.client, inquiry).await;
    state
        .sessions
        .with_session(id, |session| match result {
            Ok(reply) => session.transcript.push_exchange(inquiry, &reply),
            Err(e) => session.notice = Some(e.user_message()),
        })
        .await;

    with_cookie(cookie, Redirect::to("/"))
}

async fn clear_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, cookie) = state.sessions.resolve(&headers);
    state
        .sessions
        .peek_session(id, |session| session.transcript.clear())
        .await;
    with_cookie(cookie, Redirect::to("/"))
}

async fn tool_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ToolForm>,
) -> Response {
    let Ok(tool) = slug.parse::<Tool>() else {
        return (StatusCode::NOT_FOUND, "Unknown tool").into_response();
    };
    let (id, cookie) = state.sessions.resolve(&headers);

    info!(%tool, "Running sidebar tool");
    let outcome = tools::run_tool(&state.client, tool, &form.input).await;
    let run = ToolRun {
        tool,
        input: form.input,
        outcome,
    };
    state
        .sessions
        .with_session(id, |session| session.tool_run = Some(run))
        .await;

    with_cookie(cookie, Redirect::to("/"))
}

/// Builds the application router. Exposed for handler tests.
pub fn router(state: AppState) -> Router {
    let static_files_service = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/clear", post(clear_handler))
        .route("/tools/:tool", post(tool_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http())) // Add request logging
}

pub async fn start_web_server(host: &str, port: u16, state: AppState) -> Result<()> {
    // Bind using tokio::net::TcpListener; accepts IPv4, IPv6 and host names
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to address {}:{}", host, port))?;
    let addr = listener
        .local_addr()
        .context("Failed to read bound address")?;
    info!("Web server listening on http://{}", addr);

    serve(listener, router(state).into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
