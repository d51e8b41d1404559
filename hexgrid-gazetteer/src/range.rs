//! Lazy, cancellable query consumption.
//!
//! A query range runs the full cache visit on a background worker
//! thread and hands matches to the consumer over a channel. The
//! sequence is non-restartable; dropping it cancels the worker and
//! joins it before returning, so a range never outlives its gazetteer
//! borrow-wise or thread-wise.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver};
use hexgrid_subtree::Raster;
use tracing::debug;

use crate::error::{GazetteerError, Result};
use crate::gazetteer::Gazetteer;
use crate::region::Region;

/// A lazy stream of query matches produced by a worker thread.
///
/// Matches arrive in whatever order the feature scan discovers them,
/// not in index or key order. Dropping the range cancels the worker:
/// the cancellation counter stops the visit at its next match, the
/// disconnected channel unblocks a worker waiting on a full queue,
/// and the worker is joined unconditionally.
pub struct QueryRange<T> {
    receiver: Option<Receiver<T>>,
    cancelled: Arc<AtomicUsize>,
    worker: Option<JoinHandle<()>>,
}

/// A stream of matching feature keys.
pub type KeyRange<K> = QueryRange<K>;

/// A stream of matching `(key, feature)` pairs.
pub type FeatureRange<K, F> = QueryRange<(K, Arc<F>)>;

impl<T> Iterator for QueryRange<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.as_ref()?.recv().ok()
    }
}

impl<T> Drop for QueryRange<T> {
    fn drop(&mut self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        // Disconnecting the channel unblocks a worker waiting on a
        // full queue; its pending send fails and the visit aborts.
        self.receiver = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<K, F> Gazetteer<K, F>
where
    K: Clone + Eq + Ord + Hash + Send + Sync + 'static,
    F: Region + 'static,
{
    /// The keys of features intersecting `raster`, produced lazily on
    /// a worker thread.
    pub fn keys(self: &Arc<Self>, raster: &Raster) -> Result<KeyRange<K>> {
        self.spawn_range(raster, |key, _| key.clone())
    }

    /// The `(key, feature)` pairs intersecting `raster`, produced
    /// lazily on a worker thread.
    pub fn features(self: &Arc<Self>, raster: &Raster) -> Result<FeatureRange<K, F>> {
        self.spawn_range(raster, |key, feature| (key.clone(), Arc::clone(feature)))
    }

    fn spawn_range<T, M>(self: &Arc<Self>, raster: &Raster, map: M) -> Result<QueryRange<T>>
    where
        T: Send + 'static,
        M: Fn(&K, &Arc<F>) -> T + Send + 'static,
    {
        let (sender, receiver) = match self.config().channel_capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };
        let cancelled = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&cancelled);
        let gazetteer = Arc::clone(self);
        let raster = raster.clone();
        let worker = thread::Builder::new()
            .name("gazetteer-query".into())
            .spawn(move || {
                let result = gazetteer.visit(&raster, &mut |key, feature| {
                    if flag.load(Ordering::SeqCst) != 0 {
                        return false;
                    }
                    sender.send(map(key, feature)).is_ok()
                });
                if let Err(error) = result {
                    debug!(%error, "query range visit failed");
                }
            })
            .map_err(|e| GazetteerError::Worker(e.to_string()))?;
        Ok(QueryRange {
            receiver: Some(receiver),
            cancelled,
            worker: Some(worker),
        })
    }
}
