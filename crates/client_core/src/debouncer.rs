use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Collapses bursts of values into one callback after `delay` of quiet.
///
/// Every push restarts the timer; only the value present when the timer
/// fires reaches the callback. Dropping the debouncer (or calling
/// [`Debouncer::cancel`]) releases the timer task and drops any pending value.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, rx, on_fire));
        Self { tx, task }
    }

    /// Returns `false` once the debouncer has been cancelled.
    pub fn push(&self, value: T) -> bool {
        !self.task.is_finished() && self.tx.send(value).is_ok()
    }
}

impl<T> Debouncer<T> {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T, F>(delay: Duration, mut rx: mpsc::UnboundedReceiver<T>, mut on_fire: F)
where
    F: FnMut(T),
{
    let mut pending: Option<T> = None;
    loop {
        match pending.take() {
            None => match rx.recv().await {
                Some(value) => pending = Some(value),
                None => return,
            },
            Some(value) => {
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(next) => pending = Some(next),
                        None => return,
                    },
                    () = sleep(delay) => on_fire(value),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, move |value| sink.lock().expect("lock").push(value))
    }

    #[tokio::test]
    async fn burst_fires_once_with_the_last_value() {
        let (fired, on_fire) = recorder();
        let debouncer = Debouncer::spawn(Duration::from_millis(30), on_fire);
        for value in 1..=5 {
            assert!(debouncer.push(value));
        }
        sleep(Duration::from_millis(120)).await;
        assert_eq!(*fired.lock().expect("lock"), vec![5]);
    }

    #[tokio::test]
    async fn push_during_pending_restarts_the_timer() {
        let (fired, on_fire) = recorder();
        let debouncer = Debouncer::spawn(Duration::from_millis(80), on_fire);
        debouncer.push(1);
        sleep(Duration::from_millis(50)).await;
        debouncer.push(2);
        sleep(Duration::from_millis(50)).await;
        assert!(fired.lock().expect("lock").is_empty());
        sleep(Duration::from_millis(100)).await;
        assert_eq!(*fired.lock().expect("lock"), vec![2]);
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_value() {
        let (fired, on_fire) = recorder();
        let debouncer = Debouncer::spawn(Duration::from_millis(20), on_fire);
        debouncer.push(1);
        debouncer.cancel();
        sleep(Duration::from_millis(80)).await;
        assert!(fired.lock().expect("lock").is_empty());
        assert!(!debouncer.is_active());
        assert!(!debouncer.push(2));
    }
}
