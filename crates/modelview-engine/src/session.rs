//! Load sessions and supersession.
//!
//! Every load attempt gets a fresh, monotonically increasing token. Only the
//! session holding the latest token may commit into the viewport; a result
//! arriving for any older token is dropped. The underlying transfer is never
//! aborted, its result is just ignored.

use modelview_core::{prepare_for_display, NormalizedTransform, SceneNode};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{LoadError, LoadFailure};
use crate::resource::ResourceLocator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Incremental progress of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Percent(u8),
    /// Total size unknown
    Indeterminate,
}

impl Progress {
    pub fn from_bytes(loaded: u64, total: Option<u64>) -> Self {
        match total {
            Some(total) if total > 0 => {
                let pct = (loaded as f64 / total as f64 * 100.0).round().min(100.0);
                Progress::Percent(pct as u8)
            }
            _ => Progress::Indeterminate,
        }
    }

    pub fn status_message(&self) -> String {
        match self {
            Progress::Percent(p) => format!("Loading: {p}%"),
            Progress::Indeterminate => "Loading...".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionStatus {
    Pending,
    Progressing(Progress),
    Succeeded(NormalizedTransform),
    Failed(LoadError),
}

/// One load attempt of one resource.
#[derive(Clone, Debug)]
pub struct ModelLoadSession {
    token: SessionToken,
    resource: ResourceLocator,
    status: SessionStatus,
}

impl ModelLoadSession {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn resource(&self) -> &ResourceLocator {
        &self.resource
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Succeeded(_) | SessionStatus::Failed(_)
        )
    }
}

/// Result of a successful transfer, after the supersession check.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Current session: the normalized node is ready to be swapped in.
    Commit {
        token: SessionToken,
        resource: ResourceLocator,
        node: SceneNode,
        fit: NormalizedTransform,
    },
    /// Stale or already resolved; nothing may change.
    Discarded { token: SessionToken },
}

/// Issues session tokens and tracks the one current session of a viewport.
#[derive(Debug, Default)]
pub struct LoadTracker {
    last_issued: u64,
    current: Option<ModelLoadSession>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session for `resource`, retiring whatever session was current.
    pub fn start(&mut self, resource: ResourceLocator) -> SessionToken {
        self.last_issued += 1;
        let token = SessionToken(self.last_issued);

        if let Some(prev) = &self.current {
            if !prev.is_terminal() {
                debug!("Session {} superseded by {}", prev.token, token);
            }
        }

        self.current = Some(ModelLoadSession {
            token,
            resource,
            status: SessionStatus::Pending,
        });
        token
    }

    pub fn current(&self) -> Option<&ModelLoadSession> {
        self.current.as_ref()
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current.as_ref().is_some_and(|s| s.token == token)
    }

    /// Current and not yet resolved
    fn pending_mut(&mut self, token: SessionToken) -> Option<&mut ModelLoadSession> {
        self.current
            .as_mut()
            .filter(|s| s.token == token && !s.is_terminal())
    }

    /// Progress for the current session; `None` when `token` is stale.
    pub fn on_progress(
        &mut self,
        token: SessionToken,
        loaded: u64,
        total: Option<u64>,
    ) -> Option<Progress> {
        let session = self.pending_mut(token)?;
        let progress = Progress::from_bytes(loaded, total);
        session.status = SessionStatus::Progressing(progress);
        Some(progress)
    }

    /// Normalize `scene` for display if `token` still owns the viewport.
    pub fn on_success(&mut self, token: SessionToken, mut scene: SceneNode) -> SessionOutcome {
        let Some(session) = self.pending_mut(token) else {
            debug!("Dropping result of stale session {}", token);
            return SessionOutcome::Discarded { token };
        };

        let fit = prepare_for_display(&mut scene);
        session.status = SessionStatus::Succeeded(fit);

        SessionOutcome::Commit {
            token,
            resource: session.resource.clone(),
            node: scene,
            fit,
        }
    }

    /// Failures are reported whether the session is pending or stale. A
    /// second terminal event for the current, already resolved session is
    /// dropped and yields `None`.
    pub fn on_failure(
        &mut self,
        token: SessionToken,
        resource: ResourceLocator,
        error: LoadError,
    ) -> Option<LoadFailure> {
        if !self.is_current(token) {
            warn!("Stale session {} failed: {}", token, error);
            return Some(LoadFailure {
                token,
                resource,
                error,
                superseded: true,
            });
        }

        let Some(session) = self.pending_mut(token) else {
            debug!("Session {} already resolved; dropping failure: {}", token, error);
            return None;
        };
        session.status = SessionStatus::Failed(error.clone());

        Some(LoadFailure {
            token,
            resource,
            error,
            superseded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use modelview_core::Aabb;

    fn cube() -> SceneNode {
        SceneNode::group("root").with_child(SceneNode::mesh(
            "cube",
            Aabb::new(Vec3::ZERO, Vec3::splat(4.0)),
        ))
    }

    #[test]
    fn test_tokens_increase() {
        let mut tracker = LoadTracker::new();
        let a = tracker.start("a.glb".into());
        let b = tracker.start("b.glb".into());
        assert!(b > a);
        assert!(tracker.is_current(b));
        assert!(!tracker.is_current(a));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::from_bytes(1, Some(3)), Progress::Percent(33));
        assert_eq!(Progress::from_bytes(2, Some(3)), Progress::Percent(67));
        assert_eq!(Progress::from_bytes(50, Some(50)), Progress::Percent(100));
        assert_eq!(Progress::from_bytes(10, None), Progress::Indeterminate);
        assert_eq!(Progress::from_bytes(10, Some(0)), Progress::Indeterminate);
        assert_eq!(Progress::Percent(42).status_message(), "Loading: 42%");
    }

    #[test]
    fn test_stale_progress_dropped() {
        let mut tracker = LoadTracker::new();
        let a = tracker.start("a.glb".into());
        let _b = tracker.start("b.glb".into());
        assert_eq!(tracker.on_progress(a, 5, Some(10)), None);
    }

    #[test]
    fn test_success_commits_normalized_node() {
        let mut tracker = LoadTracker::new();
        let t = tracker.start("a.glb".into());
        assert_eq!(tracker.on_progress(t, 5, Some(10)), Some(Progress::Percent(50)));

        match tracker.on_success(t, cube()) {
            SessionOutcome::Commit { resource, node, fit, .. } => {
                assert_eq!(resource.as_str(), "a.glb");
                assert_eq!(fit.uniform_scale, 0.5);
                assert_eq!(node.transform.scale, Vec3::splat(0.5));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(matches!(
            tracker.current().map(|s| s.status()),
            Some(SessionStatus::Succeeded(_))
        ));
    }

    #[test]
    fn test_stale_success_discarded() {
        let mut tracker = LoadTracker::new();
        let a = tracker.start("a.glb".into());
        let b = tracker.start("b.glb".into());

        assert!(matches!(
            tracker.on_success(a, cube()),
            SessionOutcome::Discarded { .. }
        ));
        assert!(matches!(
            tracker.on_success(b, cube()),
            SessionOutcome::Commit { .. }
        ));
    }

    #[test]
    fn test_second_terminal_event_discarded() {
        let mut tracker = LoadTracker::new();
        let t = tracker.start("a.glb".into());
        assert!(matches!(tracker.on_success(t, cube()), SessionOutcome::Commit { .. }));
        assert!(matches!(tracker.on_success(t, cube()), SessionOutcome::Discarded { .. }));
    }

    #[test]
    fn test_failure_after_resolution_dropped() {
        let mut tracker = LoadTracker::new();
        let t = tracker.start("a.glb".into());
        assert!(matches!(tracker.on_success(t, cube()), SessionOutcome::Commit { .. }));

        let late = tracker.on_failure(t, "a.glb".into(), LoadError::Parse("late".into()));
        assert!(late.is_none());
        assert!(matches!(
            tracker.current().map(|s| s.status()),
            Some(SessionStatus::Succeeded(_))
        ));

        let f = tracker.start("f.glb".into());
        let first = tracker.on_failure(f, "f.glb".into(), LoadError::Parse("bad".into()));
        assert!(!first.unwrap().superseded);
        assert!(tracker.on_failure(f, "f.glb".into(), LoadError::Parse("again".into())).is_none());
    }

    #[test]
    fn test_failure_reported_even_when_stale() {
        let mut tracker = LoadTracker::new();
        let a = tracker.start("a.glb".into());
        let b = tracker.start("b.glb".into());

        let stale = tracker.on_failure(a, "a.glb".into(), LoadError::Parse("bad".into()));
        assert!(stale.unwrap().superseded);

        let live = tracker.on_failure(b, "b.glb".into(), LoadError::Parse("bad".into()));
        assert!(!live.unwrap().superseded);
        assert!(matches!(
            tracker.current().map(|s| s.status()),
            Some(SessionStatus::Failed(_))
        ));
    }
}
