//! Bounded byte channels
//!
//! A [`ByteChannel`] is a fixed-capacity FIFO of bytes that can be used from
//! task context and from an interrupt handler at the same time. The handler
//! side only ever uses the non-blocking `try_*` operations; tasks may also
//! wait asynchronously for space or data.
//!
//! Channels can be closed. Closing wakes every waiter, makes pushes fail
//! and lets pops drain whatever is still buffered before reporting
//! [`Closed`]. The serial transport closes a device's channels when the
//! device is closed so that no task stays blocked on a dead peripheral,
//! and clears them so a later session starts empty.
//!
//! # Example
//!
//! ```
//! use ferrule_core::{ByteChannel, TryPopError};
//!
//! static RX: ByteChannel<32> = ByteChannel::new();
//!
//! RX.try_push(b'a').unwrap();
//! assert_eq!(RX.try_pop(), Ok(b'a'));
//! assert_eq!(RX.try_pop(), Err(TryPopError::Empty));
//! ```

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use heapless::Deque;

/// Error from [`ByteChannel::try_push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TryPushError {
    /// The channel holds its full capacity
    Full,
    /// The channel was closed
    Closed,
}

/// Error from [`ByteChannel::try_pop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TryPopError {
    /// Nothing is buffered
    Empty,
    /// The channel was closed and has been drained
    Closed,
}

/// The channel was closed while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Closed;

/// Object-safe view of a byte channel
///
/// Serial devices hold their channels as `&dyn ByteQueue` so that one
/// device type works with channels of any capacity.
pub trait ByteQueue: Sync {
    /// Append a byte without waiting
    fn try_push(&self, byte: u8) -> Result<(), TryPushError>;

    /// Remove the oldest byte without waiting
    fn try_pop(&self) -> Result<u8, TryPopError>;

    /// Append a byte, registering the waker if the channel is full
    fn poll_push(&self, byte: u8, cx: &mut Context<'_>) -> Poll<Result<(), Closed>>;

    /// Remove the oldest byte, registering the waker if the channel is empty
    fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<Result<u8, Closed>>;

    /// Ready once the channel is empty, registering the waker otherwise
    fn poll_drained(&self, cx: &mut Context<'_>) -> Poll<Result<(), Closed>>;

    /// Number of buffered bytes
    fn len(&self) -> usize;

    /// Maximum number of buffered bytes
    fn capacity(&self) -> usize;

    /// Whether nothing is buffered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every buffered byte
    fn clear(&self);

    /// Close the channel and wake all waiters
    fn close(&self);

    /// Accept pushes again after [`ByteQueue::close`]
    fn reopen(&self);

    /// Whether the channel is closed
    fn is_closed(&self) -> bool;
}

struct State<const N: usize> {
    queue: Deque<u8, N>,
    closed: bool,
    senders: WakerRegistration,
    receivers: WakerRegistration,
    drained: WakerRegistration,
}

impl<const N: usize> State<N> {
    const fn new() -> Self {
        Self {
            queue: Deque::new(),
            closed: false,
            senders: WakerRegistration::new(),
            receivers: WakerRegistration::new(),
            drained: WakerRegistration::new(),
        }
    }

    fn try_push(&mut self, byte: u8) -> Result<(), TryPushError> {
        if self.closed {
            return Err(TryPushError::Closed);
        }
        self.queue
            .push_back(byte)
            .map_err(|_| TryPushError::Full)?;
        self.receivers.wake();
        Ok(())
    }

    fn try_pop(&mut self) -> Result<u8, TryPopError> {
        match self.queue.pop_front() {
            Some(byte) => {
                self.senders.wake();
                if self.queue.is_empty() {
                    self.drained.wake();
                }
                Ok(byte)
            }
            None if self.closed => Err(TryPopError::Closed),
            None => Err(TryPopError::Empty),
        }
    }
}

/// Fixed-capacity byte FIFO shared between tasks and interrupt handlers
pub struct ByteChannel<const N: usize> {
    state: Mutex<CriticalSectionRawMutex, RefCell<State<N>>>,
}

impl<const N: usize> ByteChannel<N> {
    /// Create an empty, open channel
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State::new())),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut State<N>) -> T) -> T {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    /// Append a byte without waiting
    pub fn try_push(&self, byte: u8) -> Result<(), TryPushError> {
        self.with(|s| s.try_push(byte))
    }

    /// Remove the oldest byte without waiting
    ///
    /// Buffered bytes are still returned after the channel is closed.
    pub fn try_pop(&self) -> Result<u8, TryPopError> {
        self.with(|s| s.try_pop())
    }

    /// Append a byte, waiting for space
    pub async fn push(&self, byte: u8) -> Result<(), Closed> {
        poll_fn(|cx| self.poll_push(byte, cx)).await
    }

    /// Remove the oldest byte, waiting for one to arrive
    pub async fn pop(&self) -> Result<u8, Closed> {
        poll_fn(|cx| self.poll_pop(cx)).await
    }

    /// Wait until every buffered byte has been popped
    pub async fn drained(&self) -> Result<(), Closed> {
        poll_fn(|cx| self.poll_drained(cx)).await
    }

    /// Append a byte, registering the waker if the channel is full
    pub fn poll_push(&self, byte: u8, cx: &mut Context<'_>) -> Poll<Result<(), Closed>> {
        self.with(|s| match s.try_push(byte) {
            Ok(()) => Poll::Ready(Ok(())),
            Err(TryPushError::Closed) => Poll::Ready(Err(Closed)),
            Err(TryPushError::Full) => {
                s.senders.register(cx.waker());
                Poll::Pending
            }
        })
    }

    /// Remove the oldest byte, registering the waker if the channel is empty
    pub fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<Result<u8, Closed>> {
        self.with(|s| match s.try_pop() {
            Ok(byte) => Poll::Ready(Ok(byte)),
            Err(TryPopError::Closed) => Poll::Ready(Err(Closed)),
            Err(TryPopError::Empty) => {
                s.receivers.register(cx.waker());
                Poll::Pending
            }
        })
    }

    /// Ready once the channel is empty, registering the waker otherwise
    ///
    /// A closed channel reports [`Closed`] even if it is empty.
    pub fn poll_drained(&self, cx: &mut Context<'_>) -> Poll<Result<(), Closed>> {
        self.with(|s| {
            if s.closed {
                Poll::Ready(Err(Closed))
            } else if s.queue.is_empty() {
                Poll::Ready(Ok(()))
            } else {
                s.drained.register(cx.waker());
                Poll::Pending
            }
        })
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.with(|s| s.queue.len())
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the channel holds its full capacity
    pub fn is_full(&self) -> bool {
        self.with(|s| s.queue.is_full())
    }

    /// Maximum number of buffered bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Discard every buffered byte
    pub fn clear(&self) {
        self.with(|s| {
            s.queue.clear();
            s.senders.wake();
            s.drained.wake();
        })
    }

    /// Close the channel and wake all waiters
    pub fn close(&self) {
        self.with(|s| {
            s.closed = true;
            s.senders.wake();
            s.receivers.wake();
            s.drained.wake();
        })
    }

    /// Accept pushes again after [`ByteChannel::close`]
    pub fn reopen(&self) {
        self.with(|s| s.closed = false)
    }

    /// Whether the channel is closed
    pub fn is_closed(&self) -> bool {
        self.with(|s| s.closed)
    }
}

impl<const N: usize> Default for ByteChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteQueue for ByteChannel<N> {
    fn try_push(&self, byte: u8) -> Result<(), TryPushError> {
        ByteChannel::try_push(self, byte)
    }

    fn try_pop(&self) -> Result<u8, TryPopError> {
        ByteChannel::try_pop(self)
    }

    fn poll_push(&self, byte: u8, cx: &mut Context<'_>) -> Poll<Result<(), Closed>> {
        ByteChannel::poll_push(self, byte, cx)
    }

    fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<Result<u8, Closed>> {
        ByteChannel::poll_pop(self, cx)
    }

    fn poll_drained(&self, cx: &mut Context<'_>) -> Poll<Result<(), Closed>> {
        ByteChannel::poll_drained(self, cx)
    }

    fn len(&self) -> usize {
        ByteChannel::len(self)
    }

    fn capacity(&self) -> usize {
        N
    }

    fn clear(&self) {
        ByteChannel::clear(self)
    }

    fn close(&self) {
        ByteChannel::close(self)
    }

    fn reopen(&self) {
        ByteChannel::reopen(self)
    }

    fn is_closed(&self) -> bool {
        ByteChannel::is_closed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::pin::pin;
    use core::task::Waker;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;
    use std::vec::Vec;

    use proptest::prelude::*;

    #[test]
    fn test_fifo_order() {
        let ch: ByteChannel<4> = ByteChannel::new();
        for b in b"abc" {
            ch.try_push(*b).unwrap();
        }
        assert_eq!(ch.len(), 3);
        assert_eq!(ch.try_pop(), Ok(b'a'));
        assert_eq!(ch.try_pop(), Ok(b'b'));
        assert_eq!(ch.try_pop(), Ok(b'c'));
        assert_eq!(ch.try_pop(), Err(TryPopError::Empty));
    }

    #[test]
    fn test_full_channel_rejects_push() {
        let ch: ByteChannel<2> = ByteChannel::new();
        ch.try_push(1).unwrap();
        ch.try_push(2).unwrap();
        assert!(ch.is_full());
        assert_eq!(ch.try_push(3), Err(TryPushError::Full));
        assert_eq!(ch.try_pop(), Ok(1));
        ch.try_push(3).unwrap();
    }

    #[test]
    fn test_close_drains_then_reports_closed() {
        let ch: ByteChannel<4> = ByteChannel::new();
        ch.try_push(7).unwrap();
        ch.close();

        assert_eq!(ch.try_push(8), Err(TryPushError::Closed));
        assert_eq!(ch.try_pop(), Ok(7));
        assert_eq!(ch.try_pop(), Err(TryPopError::Closed));

        ch.reopen();
        ch.try_push(8).unwrap();
        assert_eq!(ch.try_pop(), Ok(8));
    }

    #[test]
    fn test_blocked_push_completes_after_pop() {
        let ch: ByteChannel<1> = ByteChannel::new();
        ch.try_push(1).unwrap();

        let mut cx = Context::from_waker(Waker::noop());
        let mut push = pin!(ch.push(2));
        assert!(push.as_mut().poll(&mut cx).is_pending());

        assert_eq!(ch.try_pop(), Ok(1));
        assert_eq!(push.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        assert_eq!(ch.try_pop(), Ok(2));
    }

    #[test]
    fn test_close_releases_blocked_push() {
        let ch: ByteChannel<1> = ByteChannel::new();
        ch.try_push(1).unwrap();

        let mut cx = Context::from_waker(Waker::noop());
        let mut push = pin!(ch.push(2));
        assert!(push.as_mut().poll(&mut cx).is_pending());

        ch.close();
        assert_eq!(push.as_mut().poll(&mut cx), Poll::Ready(Err(Closed)));
    }

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_drained_wakes_on_last_pop() {
        let ch: ByteChannel<4> = ByteChannel::new();
        ch.try_push(1).unwrap();
        ch.try_push(2).unwrap();

        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);
        let mut drained = pin!(ch.drained());
        assert!(drained.as_mut().poll(&mut cx).is_pending());

        assert_eq!(ch.try_pop(), Ok(1));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        assert_eq!(ch.try_pop(), Ok(2));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(drained.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
    }

    #[test]
    fn test_drained_reports_close() {
        let ch: ByteChannel<4> = ByteChannel::new();
        ch.try_push(1).unwrap();

        let mut cx = Context::from_waker(Waker::noop());
        let mut drained = pin!(ch.drained());
        assert!(drained.as_mut().poll(&mut cx).is_pending());

        ch.close();
        ch.clear();
        assert_eq!(drained.as_mut().poll(&mut cx), Poll::Ready(Err(Closed)));
    }

    #[test]
    fn test_clear_discards_buffered() {
        let ch: ByteChannel<4> = ByteChannel::new();
        for b in b"abc" {
            ch.try_push(*b).unwrap();
        }
        let queue: &dyn ByteQueue = &ch;
        queue.clear();
        assert!(ch.is_empty());
        assert_eq!(ch.try_pop(), Err(TryPopError::Empty));
    }

    #[test]
    fn test_blocking_pop() {
        let ch: ByteChannel<4> = ByteChannel::new();
        ch.try_push(b'z').unwrap();
        assert_eq!(embassy_futures::block_on(ch.pop()), Ok(b'z'));
    }

    #[test]
    fn test_dyn_queue() {
        let ch: ByteChannel<3> = ByteChannel::new();
        let queue: &dyn ByteQueue = &ch;
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 3);
        queue.try_push(5).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(ch.try_pop(), Ok(5));
    }

    proptest! {
        #[test]
        fn test_matches_reference_fifo(ops in proptest::collection::vec(any::<Option<u8>>(), 0..200)) {
            let ch: ByteChannel<8> = ByteChannel::new();
            let mut model: Vec<u8> = Vec::new();

            for op in ops {
                match op {
                    Some(byte) => {
                        let result = ch.try_push(byte);
                        if model.len() < 8 {
                            prop_assert_eq!(result, Ok(()));
                            model.push(byte);
                        } else {
                            prop_assert_eq!(result, Err(TryPushError::Full));
                        }
                    }
                    None => {
                        let expected = if model.is_empty() {
                            Err(TryPopError::Empty)
                        } else {
                            Ok(model.remove(0))
                        };
                        prop_assert_eq!(ch.try_pop(), expected);
                    }
                }
                prop_assert_eq!(ch.len(), model.len());
            }
        }
    }
}
