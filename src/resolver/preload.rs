use crate::{
    config::Config,
    error::{PreloadError, ResolveError},
    resolver::Resolver,
    sync::WorkQueue,
    types::ErrorOf,
};
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;

type Failure<C> = Mutex<Option<(String, ResolveError<ErrorOf<C>>)>>;

impl<C: Config> Resolver<C> {
    /// Resolve `method_names` on `worker_count` threads to populate the cache
    /// ahead of use.
    ///
    /// - Runs at most once per resolver: later calls return `Ok(())`
    ///   immediately, whether the first one is still running or not.
    /// - `worker_count == 0` does nothing, and neither does a call whose
    ///   worker threads could not be started.
    /// - Blocks until the queue is drained and every worker has exited.
    ///
    /// A failing method does not stop the workers; the first failure is
    /// reported once all of them are done.
    ///
    /// # Errors
    /// - [`PreloadError::ThreadPool`] if the worker threads cannot be started.
    /// - [`PreloadError::Resolve`] with the first method that failed.
    pub fn preload<S: Into<String>>(
        &self,
        method_names: impl IntoIterator<Item = S>,
        worker_count: usize,
    ) -> Result<(), PreloadError<ErrorOf<C>>> {
        if worker_count == 0 {
            return Ok(());
        }
        let Some(claim) = self.preload_started.claim() else {
            tracing::debug!("preload already started");
            return Ok(());
        };
        // A pool that fails to start releases the claim.
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|idx| format!("dmg-preload-{idx}"))
            .build()?;
        claim.keep();

        let queue = WorkQueue::new(method_names.into_iter().map(Into::into));
        tracing::info!(
            methods = queue.len(),
            workers = worker_count,
            "preloading data methods"
        );

        let failure: Failure<C> = Mutex::new(None);
        pool.scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|_| self.drain(&queue, &failure));
            }
        });
        tracing::info!("preload finished");

        match failure.into_inner() {
            Some((method, source)) => Err(PreloadError::Resolve { method, source }),
            None => Ok(()),
        }
    }

    /// Worker loop: resolve names until the queue is empty.
    fn drain(&self, queue: &WorkQueue, failure: &Failure<C>) {
        while let Some(name) = queue.pop() {
            if let Err(err) = self.call(&name) {
                tracing::warn!(method = %name, %err, "preload failed");
                let mut first = failure.lock();
                if first.is_none() {
                    *first = Some((name, err));
                }
            }
        }
    }
}
