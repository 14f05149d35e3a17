//! Per-subject memoized version store.

use crate::error::LoadError;
use crate::models::{SubjectId, VersionSet};
use crate::service::ReportService;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type LoadResult = Result<Arc<VersionSet>, LoadError>;
type PendingFetch = Shared<BoxFuture<'static, LoadResult>>;

enum Entry {
    /// A fetch is outstanding; every waiter polls the same future.
    Pending(PendingFetch),
    /// A loaded set. Stale sets are re-fetched on the next load.
    Ready { set: Arc<VersionSet>, fresh: bool },
}

/// Key-scoped cache of version sets, backed by a [`ReportService`].
///
/// A subject is fetched at most once until it is invalidated. Concurrent
/// loads of the same subject share one in-flight request. Failures are
/// not cached.
pub struct VersionStore {
    service: Arc<dyn ReportService>,
    entries: Mutex<HashMap<SubjectId, Entry>>,
}

impl VersionStore {
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        Self {
            service,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Load the versions of `subject`, fetching only when nothing fresh is
    /// held and no fetch is already outstanding.
    pub async fn load(&self, subject: &SubjectId, user_id: Option<&str>) -> LoadResult {
        let fetch = {
            let mut entries = self.entries.lock().await;
            let in_flight = match entries.get(subject) {
                Some(Entry::Ready { set, fresh: true }) => {
                    debug!("Cache hit for subject {}", subject);
                    return Ok(Arc::clone(set));
                }
                Some(Entry::Pending(fetch)) => Some(fetch.clone()),
                _ => None,
            };

            match in_flight {
                Some(fetch) => {
                    debug!("Joining in-flight fetch for subject {}", subject);
                    fetch
                }
                None => {
                    debug!("Cache miss for subject {}", subject);
                    let fetch = self.start_fetch(subject, user_id);
                    entries.insert(subject.clone(), Entry::Pending(fetch.clone()));
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        let mut entries = self.entries.lock().await;
        let still_pending = matches!(
            entries.get(subject),
            Some(Entry::Pending(current)) if current.ptr_eq(&fetch)
        );
        if still_pending {
            match result {
                Ok(ref set) => {
                    entries.insert(
                        subject.clone(),
                        Entry::Ready {
                            set: Arc::clone(set),
                            fresh: true,
                        },
                    );
                }
                Err(_) => {
                    entries.remove(subject);
                }
            }
        }

        result
    }

    fn start_fetch(&self, subject: &SubjectId, user_id: Option<&str>) -> PendingFetch {
        let service = Arc::clone(&self.service);
        let subject = subject.clone();
        let user_id = user_id.map(str::to_string);

        async move {
            info!("Fetching versions for subject {}", subject);
            match service.fetch_versions(&subject, user_id.as_deref()).await {
                Ok(response) => {
                    let set = VersionSet::from(response);
                    info!("Loaded {} versions for subject {}", set.len(), subject);
                    Ok(Arc::new(set))
                }
                Err(e) => {
                    warn!("Loading versions for subject {} failed: {}", subject, e);
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Mark `subject` stale so the next load re-fetches. An outstanding
    /// fetch is detached: its waiters still get the result, but it is not
    /// cached.
    pub async fn invalidate(&self, subject: &SubjectId) {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(subject) {
            Some(Entry::Ready { fresh, .. }) => {
                debug!("Invalidated subject {}", subject);
                *fresh = false;
            }
            Some(Entry::Pending(_)) => {
                debug!("Detached in-flight fetch for subject {}", subject);
                entries.remove(subject);
            }
            None => {}
        }
    }

    /// The held set for `subject` and whether it is fresh. No I/O.
    pub async fn cached(&self, subject: &SubjectId) -> Option<(Arc<VersionSet>, bool)> {
        let entries = self.entries.lock().await;
        match entries.get(subject) {
            Some(Entry::Ready { set, fresh }) => Some((Arc::clone(set), *fresh)),
            _ => None,
        }
    }

    /// Evict the loaded sets of every subject except `subject`. Outstanding
    /// fetches are kept so switching back joins them instead of re-fetching.
    pub async fn retain_only(&self, subject: &SubjectId) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, entry| key == subject || matches!(entry, Entry::Pending(_)));
        if entries.len() < before {
            debug!("Evicted {} other subjects", before - entries.len());
        }
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
