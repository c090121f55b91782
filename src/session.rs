//! Admin sessions.
//!
//! Sessions live in the `sessions` table and are keyed by a random id
//! carried in the [`SESSION_COOKIE_NAME`] cookie. A session is created
//! lazily by [`ensure_session`] on the first request that lacks a valid one.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::db::{try_lock, LogOnError};
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "svc_admin_session";

/// Create a new session
pub fn create_session(conn: &Connection, session_id: &str, duration_hours: i64) -> Result<()> {
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        "INSERT INTO sessions (id, created_at, expires_at, last_access_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            session_id,
            now.to_rfc3339(),
            expires.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Issue a fresh session, purging expired ones first
pub fn start_session(conn: &Connection, duration_hours: i64) -> Result<String> {
    let purged = cleanup_expired_sessions(conn)?;
    if purged > 0 {
        tracing::debug!("Removed {} expired sessions", purged);
    }
    let session_id = generate_session_id();
    create_session(conn, &session_id, duration_hours)?;
    Ok(session_id)
}

/// Check a session is live and record the access
pub fn touch_session(conn: &Connection, session_id: &str) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let found: Option<String> = conn
        .query_row(
            "SELECT id FROM sessions WHERE id = ?1 AND expires_at > ?2",
            params![session_id, now],
            |row| row.get(0),
        )
        .optional()?;
    if found.is_none() {
        return Ok(false);
    }
    conn.execute(
        "UPDATE sessions SET last_access_at = ?1 WHERE id = ?2",
        params![now, session_id],
    )?;
    Ok(true)
}

pub fn session_exists(conn: &Connection, session_id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sessions WHERE id = ?1",
        params![session_id],
        |row| row.get(0),
    )
}

/// Delete a session (logout)
pub fn invalidate_session(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(())
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
    Ok(count)
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

pub fn session_cookie(session_id: String, duration_hours: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(duration_hours))
        .build()
}

/// Session of the current request, installed by [`ensure_session`].
/// `None` only when the session store was unavailable.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or(CurrentSession(None)))
    }
}

/// Middleware giving every request a live session
pub async fn ensure_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string());

    // Reuse the cookie's session when it is still live
    if let Some(session_id) = existing {
        let live = match try_lock(&state.session_db) {
            Ok(conn) => touch_session(&conn, &session_id).log_warn_default("Failed to check session"),
            Err(_) => false,
        };
        if live {
            request.extensions_mut().insert(CurrentSession(Some(session_id)));
            return next.run(request).await;
        }
        tracing::debug!("Session cookie no longer valid, issuing a new session");
    }

    let created = match try_lock(&state.session_db) {
        Ok(conn) => start_session(&conn, state.session_hours).log_warn("Failed to create session"),
        Err(_) => None,
    };
    let Some(session_id) = created else {
        request.extensions_mut().insert(CurrentSession(None));
        return next.run(request).await;
    };

    request
        .extensions_mut()
        .insert(CurrentSession(Some(session_id.clone())));
    let response = next.run(request).await;

    // The handler may have invalidated the session it was just given (logout)
    let still_live = match try_lock(&state.session_db) {
        Ok(conn) => session_exists(&conn, &session_id).log_warn_default("Failed to check session"),
        Err(_) => false,
    };
    if !still_live {
        return response;
    }

    (jar.add(session_cookie(session_id, state.session_hours)), response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_generated_ids_are_random_alphanumeric() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_touch_invalidate() {
        let pool = open_in_memory().unwrap();
        let conn = pool.lock().unwrap();

        create_session(&conn, "abc", 1).unwrap();
        assert!(touch_session(&conn, "abc").unwrap());
        assert!(session_exists(&conn, "abc").unwrap());

        invalidate_session(&conn, "abc").unwrap();
        assert!(!touch_session(&conn, "abc").unwrap());
        assert!(!session_exists(&conn, "abc").unwrap());
    }

    #[test]
    fn test_expired_session_is_not_live_and_gets_cleaned() {
        let pool = open_in_memory().unwrap();
        let conn = pool.lock().unwrap();

        create_session(&conn, "old", -1).unwrap();
        create_session(&conn, "new", 1).unwrap();
        assert!(!touch_session(&conn, "old").unwrap());

        assert_eq!(cleanup_expired_sessions(&conn).unwrap(), 1);
        assert!(!session_exists(&conn, "old").unwrap());
        assert!(session_exists(&conn, "new").unwrap());
    }

    #[test]
    fn test_starting_session_purges_expired_ones() {
        let pool = open_in_memory().unwrap();
        let conn = pool.lock().unwrap();

        create_session(&conn, "stale-1", -1).unwrap();
        create_session(&conn, "stale-2", -2).unwrap();
        create_session(&conn, "live", 1).unwrap();

        let fresh = start_session(&conn, 1).unwrap();

        assert!(!session_exists(&conn, "stale-1").unwrap());
        assert!(!session_exists(&conn, "stale-2").unwrap());
        assert!(session_exists(&conn, "live").unwrap());
        assert!(touch_session(&conn, &fresh).unwrap());
    }

    #[test]
    fn test_invalidating_unknown_session_is_ok() {
        let pool = open_in_memory().unwrap();
        let conn = pool.lock().unwrap();
        invalidate_session(&conn, "nope").unwrap();
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("xyz".to_string(), 8);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "xyz");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
