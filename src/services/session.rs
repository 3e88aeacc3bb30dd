//! In-memory per-user session state.
//!
//! [`SessionStore`] is the single owner of every user's current analysis,
//! favorites list and in-flight flag. Callers never hold a reference into a
//! session: they get [`SessionSnapshot`] copies and mutate through the store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::analysis::{FavoriteStats, MarketComparison, PricePosition, QuotationAnalysis};
use crate::error::ApiError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an analysis is already running for this session")]
    AnalysisInProgress,

    #[error("vendor is already in favorites")]
    AlreadyFavorite,

    #[error("favorite index {0} is out of range")]
    FavoriteNotFound(usize),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AnalysisInProgress => ApiError::Conflict {
                code: "ANALYSIS_IN_PROGRESS",
                message: "An analysis is already running. Please wait for it to finish.",
            },
            SessionError::AlreadyFavorite => ApiError::Conflict {
                code: "ALREADY_FAVORITE",
                message: "This vendor is already saved to your favorites.",
            },
            SessionError::FavoriteNotFound(_) => ApiError::NotFound("Favorite not found"),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredAnalysis {
    analysis: QuotationAnalysis,
    location: String,
    analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Session {
    current: Option<StoredAnalysis>,
    favorites: Vec<MarketComparison>,
    in_flight: bool,
}

/// Immutable view of one user's session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub analysis: Option<QuotationAnalysis>,
    pub location: Option<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub verdict: Option<PricePosition>,
    pub favorites: Vec<MarketComparison>,
    pub favorite_stats: Option<FavoriteStats>,
    pub in_flight: bool,
}

impl SessionSnapshot {
    fn of(session: &Session) -> Self {
        let verdict = session
            .current
            .as_ref()
            .and_then(|stored| stored.analysis.report())
            .and_then(|report| report.summary.verdict());

        Self {
            analysis: session.current.as_ref().map(|s| s.analysis.clone()),
            location: session.current.as_ref().map(|s| s.location.clone()),
            analyzed_at: session.current.as_ref().map(|s| s.analyzed_at),
            verdict,
            favorites: session.favorites.clone(),
            favorite_stats: FavoriteStats::from_favorites(&session.favorites),
            in_flight: session.in_flight,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an analysis as running for `user`.
    ///
    /// The returned guard clears the flag when dropped, whether the handler
    /// finished, failed or was abandoned mid-await.
    pub fn begin_analysis(&self, user: &str) -> Result<InFlightGuard, SessionError> {
        let mut sessions = self.inner.write();
        let session = sessions.entry(user.to_string()).or_default();
        if session.in_flight {
            return Err(SessionError::AnalysisInProgress);
        }
        session.in_flight = true;

        Ok(InFlightGuard {
            store: self.clone(),
            user: user.to_string(),
        })
    }

    pub fn record_analysis(&self, user: &str, analysis: QuotationAnalysis, location: &str) {
        let mut sessions = self.inner.write();
        sessions.entry(user.to_string()).or_default().current = Some(StoredAnalysis {
            analysis,
            location: location.to_string(),
            analyzed_at: Utc::now(),
        });
    }

    pub fn add_favorite(
        &self,
        user: &str,
        comparison: MarketComparison,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.inner.write();
        let session = sessions.entry(user.to_string()).or_default();
        if session.favorites.iter().any(|f| f.same_listing(&comparison)) {
            return Err(SessionError::AlreadyFavorite);
        }
        session.favorites.push(comparison);
        Ok(SessionSnapshot::of(session))
    }

    pub fn remove_favorite(&self, user: &str, index: usize) -> Result<(), SessionError> {
        let mut sessions = self.inner.write();
        let favorites = sessions
            .get_mut(user)
            .map(|s| &mut s.favorites)
            .filter(|f| index < f.len())
            .ok_or(SessionError::FavoriteNotFound(index))?;
        favorites.remove(index);
        Ok(())
    }

    pub fn clear_favorites(&self, user: &str) {
        if let Some(session) = self.inner.write().get_mut(user) {
            session.favorites.clear();
        }
    }

    pub fn snapshot(&self, user: &str) -> SessionSnapshot {
        let sessions = self.inner.read();
        match sessions.get(user) {
            Some(session) => SessionSnapshot::of(session),
            None => SessionSnapshot::of(&Session::default()),
        }
    }

    /// Current analysis with its location, if one is held.
    pub fn current_analysis(&self, user: &str) -> Option<(QuotationAnalysis, String)> {
        let sessions = self.inner.read();
        sessions
            .get(user)
            .and_then(|s| s.current.as_ref())
            .map(|stored| (stored.analysis.clone(), stored.location.clone()))
    }

    fn finish_analysis(&self, user: &str) {
        if let Some(session) = self.inner.write().get_mut(user) {
            session.in_flight = false;
        }
    }
}

/// Clears a session's in-flight flag on drop.
#[must_use = "dropping the guard ends the in-flight window immediately"]
pub struct InFlightGuard {
    store: SessionStore,
    user: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.store.finish_analysis(&self.user);
    }
}
