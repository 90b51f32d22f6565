//! The wait-or-redirect gateway page.
//!
//! A client arriving with a valid admission token in its cookie is
//! redirected straight to the protected resource; everyone else is
//! registered (or, if already waiting, re-ranked) and shown the wait page.

use crate::{errors::AppResult, infra::app_state::AppState};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use vestibule_core::AdmissionError;

#[derive(Debug, Deserialize)]
pub struct WaitingRoomParams {
    #[serde(default = "super::default_queue")]
    pub queue: String,
    pub user_id: u64,
    pub redirect_url: String,
}

/// Name of the cookie carrying the admission token for `queue`.
pub fn token_cookie_name(queue: &str) -> String {
    format!("user-queue-{queue}-token")
}

/// Pull a named cookie's value out of the `Cookie` header, if present.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get("cookie")?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let parts: Vec<&str> = cookie.trim().splitn(2, '=').collect();
            if parts.len() == 2 && parts[0] == name {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

pub async fn waiting_room(
    State(state): State<AppState>,
    Query(params): Query<WaitingRoomParams>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let cookie_name = token_cookie_name(&params.queue);
    let token = extract_cookie(&headers, &cookie_name).unwrap_or_default();

    if state
        .engine
        .is_allowed_by_token(&params.queue, params.user_id, &token)
    {
        return Ok(Redirect::to(&params.redirect_url).into_response());
    }

    let rank = match state.engine.register(&params.queue, params.user_id).await {
        Ok(rank) => rank,
        Err(AdmissionError::AlreadyQueued { .. }) => {
            state.engine.rank(&params.queue, params.user_id).await?
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Html(render_wait_page(&params.queue, params.user_id, rank)).into_response())
}

fn render_wait_page(queue: &str, user_id: u64, rank: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="3">
  <title>Waiting room</title>
</head>
<body>
  <h1>You are in the waiting room</h1>
  <p>Queue: <strong>{queue}</strong></p>
  <p>User: <strong>{user_id}</strong></p>
  <p>Your number in line: <strong>{rank}</strong></p>
  <p>This page refreshes automatically. Please keep it open.</p>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_name_embeds_queue() {
        assert_eq!(token_cookie_name("sale"), "user-queue-sale-token");
    }

    #[test]
    fn extracts_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static(
                "session=abc; user-queue-sale-token=deadbeef; theme=dark",
            ),
        );
        assert_eq!(
            extract_cookie(&headers, "user-queue-sale-token").as_deref(),
            Some("deadbeef")
        );
        assert_eq!(extract_cookie(&headers, "user-queue-other-token"), None);
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        assert_eq!(extract_cookie(&HeaderMap::new(), "anything"), None);
    }

    #[test]
    fn wait_page_shows_rank_user_and_queue() {
        let page = render_wait_page("sale", 1001, 3);
        assert!(page.contains("sale"));
        assert!(page.contains("1001"));
        assert!(page.contains("<strong>3</strong>"));
    }
}
