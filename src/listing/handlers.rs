//! HTTP handlers for the request listing page
//!
//! Both handlers resolve the browser session from its cookie, delegate to
//! [`RequestsView`], persist the session when it changed and render the
//! page. Clients sending `Accept: application/json` receive the page
//! context as JSON instead of HTML.

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::{
        HeaderMap, HeaderValue,
        header::{ACCEPT, COOKIE, SET_COOKIE},
    },
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{ListingResult, RequestError, SessionError};
use crate::core::session::{Session, SessionStore};
use crate::listing::template::ListingTemplates;
use crate::listing::view::{ListingContext, RequestsView};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub view: Arc<RequestsView>,
    pub sessions: Arc<dyn SessionStore>,
    pub templates: Arc<ListingTemplates>,
    /// Name of the cookie carrying the session id
    pub session_cookie: Arc<str>,
}

/// A session together with what is needed to persist it afterwards
struct ActiveSession {
    session: Session,
    snapshot: Option<Session>,
}

impl AppState {
    async fn open_session(&self, headers: &HeaderMap) -> ListingResult<ActiveSession> {
        if let Some(id) = session_id(headers, &self.session_cookie) {
            let loaded = self
                .sessions
                .load(&id)
                .await
                .map_err(|e| SessionError::Backend {
                    message: e.to_string(),
                })?;
            if let Some(session) = loaded {
                return Ok(ActiveSession {
                    snapshot: Some(session.clone()),
                    session,
                });
            }
            tracing::debug!(session_id = %id, "Unknown session id, starting a new session");
        }
        Ok(ActiveSession {
            session: Session::new(),
            snapshot: None,
        })
    }

    /// Save the session if it is new or was modified
    ///
    /// Returns the cookie to set for a new session.
    async fn close_session(&self, active: ActiveSession) -> ListingResult<Option<HeaderValue>> {
        let is_new = active.snapshot.is_none();
        if is_new || active.snapshot.as_ref() != Some(&active.session) {
            self.sessions
                .save(&active.session)
                .await
                .map_err(|e| SessionError::Backend {
                    message: e.to_string(),
                })?;
        }
        if !is_new {
            return Ok(None);
        }

        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.session_cookie, active.session.id
        );
        let value = HeaderValue::from_str(&cookie).map_err(|e| SessionError::Backend {
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }

    /// Render the view outcome, attaching the session cookie either way
    fn respond(
        &self,
        headers: &HeaderMap,
        outcome: ListingResult<ListingContext>,
        cookie: Option<HeaderValue>,
    ) -> ListingResult<Response> {
        let mut response = match outcome {
            Ok(ctx) if wants_json(headers) => Json(ctx).into_response(),
            Ok(ctx) => Html(self.templates.render(&ctx)?).into_response(),
            Err(e) => e.into_response(),
        };
        if let Some(cookie) = cookie {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Ok(response)
    }
}

/// List profiled requests
///
/// GET /?show=..&order_by=..&order_dir=..&view_style=..&path=..
pub async fn list_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ListingResult<Response> {
    let Query(params) = query.map_err(|e| RequestError::InvalidQuery {
        message: e.body_text(),
    })?;

    let mut active = state.open_session(&headers).await?;
    // The merged mapping is saved even when the page fails to build
    let outcome = state.view.get(&mut active.session, &params).await;
    let cookie = state.close_session(active).await?;

    state.respond(&headers, outcome, cookie)
}

/// Replace the stored filters with the submitted ones
///
/// POST / with `filter-<ident>-typ` and `filter-<ident>-value` form fields
pub async fn filter_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> ListingResult<Response> {
    let Query(params) = query.map_err(|e| RequestError::InvalidQuery {
        message: e.body_text(),
    })?;
    let Form(fields) = form.map_err(|e| RequestError::InvalidBody {
        message: e.body_text(),
    })?;

    let mut active = state.open_session(&headers).await?;
    let outcome = state
        .view
        .post(&mut active.session, &params, &fields)
        .await;
    let cookie = state.close_session(active).await?;

    state.respond(&headers, outcome, cookie)
}

/// Extract the session id from the request cookies
fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}
