//! A thread-safe oneshot channel carrying a single value.
//!
//! Senders and receivers may both be cloned; only the first successful send
//! is delivered, and only one receiver consumes the value. The channel
//! closes when all senders drop without sending.

use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};

/// Creates a new oneshot channel, returning the sender/receiver pair.
pub fn channel<T>() -> (OneshotSender<T>, OneshotReceiver<T>) {
    let cell = Arc::new(OneshotCell::new());
    (OneshotSender(cell.clone()), OneshotReceiver(cell))
}

/// Creates a receiver that is already resolved with `result`.
pub fn ready<T>(result: T) -> OneshotReceiver<T> {
    OneshotReceiver(Arc::new(OneshotCell::ready(result)))
}

/// The sending half of a oneshot channel.
pub struct OneshotSender<T>(Arc<OneshotCell<T>>);

impl<T> OneshotSender<T> {
    /// Sends a value. Returns `Err(value)` if a value was already sent or
    /// the channel is closed.
    pub fn send(&self, value: T) -> Result<(), T> {
        self.0.set(value)
    }

    /// Returns `true` while no value has been sent and the channel is open.
    pub fn is_pending(&self) -> bool {
        self.0.is_pending()
    }
}

impl<T> Clone for OneshotSender<T> {
    fn clone(&self) -> OneshotSender<T> {
        self.0.add_sender();
        OneshotSender(self.0.clone())
    }
}

impl<T> Drop for OneshotSender<T> {
    fn drop(&mut self) {
        self.0.drop_sender();
    }
}

/// The receiving half of a oneshot channel.
#[derive(Clone)]
pub struct OneshotReceiver<T>(Arc<OneshotCell<T>>);

impl<T> OneshotReceiver<T> {
    /// Blocks until a value arrives or the channel closes.
    ///
    /// Returns `None` if the value was already consumed or every sender
    /// dropped without sending.
    pub fn recv(&self) -> Option<T> {
        self.0.wait()
    }

    /// Returns `true` while no value has been sent and the channel is open.
    pub fn is_pending(&self) -> bool {
        self.0.is_pending()
    }
}

struct OneshotCell<T> {
    value: Mutex<State<T>>,
    condvar: Condvar,
    senders: AtomicUsize,
}

impl<T> OneshotCell<T> {
    fn new() -> OneshotCell<T> {
        OneshotCell {
            value: Mutex::new(State::Pending),
            condvar: Condvar::new(),
            senders: AtomicUsize::new(1),
        }
    }

    fn ready(value: T) -> OneshotCell<T> {
        OneshotCell {
            value: Mutex::new(State::Ready(value)),
            condvar: Condvar::new(),
            senders: AtomicUsize::new(1),
        }
    }

    fn set(&self, value: T) -> Result<(), T> {
        let res = self.value.lock().expect("lock").set(value);
        self.condvar.notify_all();
        res
    }

    fn is_pending(&self) -> bool {
        self.value.lock().expect("lock").is_pending()
    }

    fn wait(&self) -> Option<T> {
        let guard = self.value.lock().expect("lock");
        self.condvar
            .wait_while(guard, |state| state.is_pending())
            .expect("wait")
            .take()
    }

    fn cancel(&self) {
        self.value.lock().expect("lock").cancel();
        self.condvar.notify_all();
    }

    fn add_sender(&self) {
        self.senders.fetch_add(1, Ordering::SeqCst);
    }

    fn drop_sender(&self) {
        if self.senders.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.cancel();
        }
    }
}

/// `Pending -> Ready(T)` on send, `Pending -> Consumed` on cancellation,
/// `Ready(T) -> Consumed` when the value is taken.
enum State<T> {
    Pending,
    Ready(T),
    Consumed,
}

impl<T> State<T> {
    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    fn set(&mut self, value: T) -> Result<(), T> {
        match self {
            State::Pending => {
                *self = State::Ready(value);
                Ok(())
            }
            State::Ready(_) | State::Consumed => Err(value),
        }
    }

    fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, State::Consumed) {
            State::Pending => panic!("State::take: value is not ready yet"),
            State::Ready(value) => Some(value),
            State::Consumed => None,
        }
    }

    fn cancel(&mut self) {
        if self.is_pending() {
            *self = State::Consumed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_send_recv() {
        let (tx, rx) = channel::<usize>();
        assert!(rx.is_pending());
        tx.send(7).unwrap();
        assert_eq!(rx.recv(), Some(7));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_recv_blocks_until_send() {
        let (tx, rx) = channel::<usize>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send(1).unwrap();
        });
        assert_eq!(rx.recv(), Some(1));
    }

    #[test]
    fn test_dropping_all_senders_closes_channel() {
        let (tx, rx) = channel::<usize>();
        let tx2 = tx.clone();
        drop(tx);
        assert!(rx.is_pending());
        drop(tx2);
        assert_eq!(rx.recv(), None);
        assert!(!rx.is_pending());
    }

    #[test]
    fn test_second_send_fails() {
        let (tx, rx) = channel::<usize>();
        tx.send(1).unwrap();
        assert_eq!(tx.send(2), Err(2));
        assert_eq!(rx.recv(), Some(1));
    }

    #[test]
    fn test_ready_receiver() {
        let rx = ready(42);
        assert!(!rx.is_pending());
        assert_eq!(rx.recv(), Some(42));
    }
}
