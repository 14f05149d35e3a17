//! Per-session comparison state machine.
//!
//! ```text
//! Collapsed --open--> Loading --ok--> Loaded --close--> Collapsed
//!                        |
//!                        +--err--> LoadError --retry--> Loading
//!                                            --dismiss--> Collapsed
//! ```
//!
//! Every open takes a monotonic token. A fetch that completes after the
//! token moved on (close, or a different subject) is discarded instead of
//! being applied to the view.

use crate::comparison::{self, Comparison, Navigation};
use crate::error::LoadError;
use crate::loader::VersionStore;
use crate::models::{AnalysisId, SubjectId, VersionSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the comparison view currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Collapsed,
    Loading {
        subject: SubjectId,
    },
    Loaded {
        subject: SubjectId,
        versions: Arc<VersionSet>,
    },
    LoadError {
        subject: SubjectId,
        error: LoadError,
    },
}

/// Result of an open request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Loaded(Arc<VersionSet>),
    Failed(LoadError),
    /// The view was closed or moved to another subject while loading.
    Stale,
}

#[derive(Default)]
struct Inner {
    state: ViewState,
    token: u64,
    subject: Option<SubjectId>,
}

/// The comparison view of one session, owning its version store.
pub struct ComparisonSession {
    store: VersionStore,
    user_id: Option<String>,
    inner: Mutex<Inner>,
}

impl ComparisonSession {
    /// `user_id` is forwarded with every fetch for access scoping.
    pub fn new(store: VersionStore, user_id: Option<String>) -> Self {
        Self {
            store,
            user_id,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Open the comparison for `subject` and load its versions.
    ///
    /// Opening the subject that is already loading joins the outstanding
    /// fetch. Opening a different subject evicts the previous one's loaded
    /// set; a fetch still outstanding for it is kept and joined on return.
    pub async fn open_comparison(&self, subject: SubjectId) -> OpenOutcome {
        let (token, switching) = {
            let mut inner = self.inner.lock().await;
            let joining = matches!(
                &inner.state,
                ViewState::Loading { subject: loading } if *loading == subject
            );
            if !joining {
                inner.token += 1;
            }
            let switching = inner.subject.as_ref().is_some_and(|s| *s != subject);
            inner.subject = Some(subject.clone());
            inner.state = ViewState::Loading {
                subject: subject.clone(),
            };
            (inner.token, switching)
        };

        if switching {
            info!("Comparison subject changed to {}", subject);
            self.store.retain_only(&subject).await;
        }

        let result = self.store.load(&subject, self.user_id.as_deref()).await;

        let mut inner = self.inner.lock().await;
        if inner.token != token {
            warn!("Discarding stale versions for subject {}", subject);
            return OpenOutcome::Stale;
        }

        match result {
            Ok(versions) => {
                debug!("Comparison loaded for subject {}", subject);
                inner.state = ViewState::Loaded {
                    subject,
                    versions: Arc::clone(&versions),
                };
                OpenOutcome::Loaded(versions)
            }
            Err(error) => {
                inner.state = ViewState::LoadError {
                    subject,
                    error: error.clone(),
                };
                OpenOutcome::Failed(error)
            }
        }
    }

    /// Collapse the view. A fetch still outstanding is discarded on arrival.
    pub async fn close_comparison(&self) {
        let mut inner = self.inner.lock().await;
        inner.token += 1;
        inner.state = ViewState::Collapsed;
    }

    /// Reload after a failure. `None` unless the view is in `LoadError`.
    pub async fn retry(&self) -> Option<OpenOutcome> {
        let subject = match &self.inner.lock().await.state {
            ViewState::LoadError { subject, .. } => subject.clone(),
            _ => return None,
        };
        Some(self.open_comparison(subject).await)
    }

    /// Dismiss the inline error message.
    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, ViewState::LoadError { .. }) {
            inner.state = ViewState::Collapsed;
        }
    }

    /// Navigation intent for a selected version. The host performs it.
    pub async fn select_version(&self, analysis_id: &AnalysisId) -> Navigation {
        match &self.inner.lock().await.state {
            ViewState::Loaded { versions, .. } => comparison::navigate_target(versions, analysis_id),
            _ => Navigation::NoOp,
        }
    }

    /// Mark the active subject stale, e.g. after a new version was produced.
    pub async fn invalidate(&self) {
        let subject = self.inner.lock().await.subject.clone();
        if let Some(subject) = subject {
            self.store.invalidate(&subject).await;
        }
    }

    pub async fn state(&self) -> ViewState {
        self.inner.lock().await.state.clone()
    }

    /// Whether the host should show the comparison affordance.
    pub async fn is_comparison_available(&self) -> bool {
        match &self.inner.lock().await.state {
            ViewState::Loaded { versions, .. } => comparison::should_display(versions),
            _ => false,
        }
    }

    /// Summary of the loaded versions.
    pub async fn comparison(&self) -> Option<Comparison> {
        match &self.inner.lock().await.state {
            ViewState::Loaded { versions, .. } => Some(comparison::compare(versions)),
            _ => None,
        }
    }
}
