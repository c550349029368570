use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const NOTE_SAVE_DELAY: Duration = Duration::from_millis(500);

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner<K> {
    next_generation: u64,
    pending: HashMap<K, Pending>,
}

/// Per-key trailing debounce: only the last job scheduled for a key within
/// `delay` runs. Jobs for different keys are independent.
#[derive(Clone)]
pub struct Debouncer<K> {
    delay: Duration,
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner {
                next_generation: 0,
                pending: HashMap::new(),
            })),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any job still waiting for `key`. A job that already started
    /// is left to finish.
    pub fn schedule<F>(&self, key: K, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;

        let delay = self.delay;
        let shared = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut inner = match shared.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if inner
                    .pending
                    .get(&task_key)
                    .is_some_and(|p| p.generation == generation)
                {
                    inner.pending.remove(&task_key);
                }
            }
            job.await;
        });

        if let Some(previous) = inner.pending.insert(key, Pending { generation, handle }) {
            previous.handle.abort();
        }
    }

    pub fn cancel(&self, key: &K) -> bool {
        match self.lock().pending.remove(key) {
            Some(previous) => {
                previous.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<K>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let job = move |value: &str| {
            let sink = sink.clone();
            let value = value.to_string();
            Box::pin(async move {
                sink.lock().unwrap().push(value);
            }) as std::pin::Pin<Box<dyn Future<Output = ()> + Send>>
        };
        (calls, job)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_job_runs() {
        let debouncer = Debouncer::new(NOTE_SAVE_DELAY);
        let (calls, job) = recorder();

        debouncer.schedule("img".to_string(), job("w"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule("img".to_string(), job("wa"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule("img".to_string(), job("warm"));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(calls.lock().unwrap().is_empty());
        assert!(debouncer.is_pending(&"img".to_string()));

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(*calls.lock().unwrap(), vec!["warm".to_string()]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::new(NOTE_SAVE_DELAY);
        let (calls, job) = recorder();

        debouncer.schedule("a".to_string(), job("a1"));
        debouncer.schedule("b".to_string(), job("b1"));
        debouncer.schedule("a".to_string(), job("a2"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        let mut seen = calls.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a2".to_string(), "b1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_job() {
        let debouncer = Debouncer::new(NOTE_SAVE_DELAY);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        debouncer.schedule(1u32, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel(&1));
        assert!(!debouncer.cancel(&1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
