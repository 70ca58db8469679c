//! Affinity context: the one thread change notifications are delivered on.
//!
//! The owning thread creates a [`DispatchQueue`] and hands out
//! [`AffinityContext`] handles. Code holding a handle calls
//! [`AffinityContext::dispatch`]: on the owning thread the job runs inline,
//! anywhere else it is queued and the caller returns straight away. The
//! owner runs queued jobs with [`DispatchQueue::run_pending`], typically once
//! per UI frame.

use log::{debug, trace};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

pub type Job = Box<dyn FnOnce() + Send + 'static>;
pub type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Cloneable, thread-safe handle to an affinity thread's queue.
#[derive(Clone)]
pub struct AffinityContext {
    owner: ThreadId,
    sender: Sender<Job>,
    waker: Arc<Mutex<Option<Waker>>>,
}

/// Receiving end of the queue. Stays on the thread that created it.
pub struct DispatchQueue {
    receiver: Receiver<Job>,
    context: AffinityContext,
    _not_send: PhantomData<Rc<()>>, // Pins the queue to its owning thread
}

impl DispatchQueue {
    /// Creates a queue owned by the calling thread.
    pub fn for_current_thread() -> Self {
        let (sender, receiver) = mpsc::channel();
        let context = AffinityContext {
            owner: thread::current().id(),
            sender,
            waker: Arc::new(Mutex::new(None)),
        };
        Self {
            receiver,
            context,
            _not_send: PhantomData,
        }
    }

    pub fn context(&self) -> AffinityContext {
        self.context.clone()
    }

    /// Runs every job queued so far, in arrival order. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        if ran > 0 {
            trace!("Ran {} queued notification job(s).", ran);
        }
        ran
    }
}

impl AffinityContext {
    /// True when called from the thread that owns the queue.
    pub fn has_thread_access(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Runs `job` now if we're on the owning thread, otherwise queues it.
    /// Never blocks.
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.has_thread_access() {
            job();
            return;
        }

        if self.sender.send(Box::new(job)).is_err() {
            // Queue is gone (owner shut down); nobody is left to notify
            debug!("Affinity queue closed, dropping notification.");
            return;
        }

        let waker = match self.waker.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                log::error!("Affinity waker mutex poisoned!");
                poisoned.into_inner().clone()
            }
        };
        if let Some(wake) = waker {
            wake();
        }
    }

    /// Called after each cross-thread enqueue, e.g. to request a repaint.
    pub fn set_waker<F>(&self, wake: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        match self.waker.lock() {
            Ok(mut guard) => *guard = Some(Arc::new(wake)),
            Err(poisoned) => {
                log::error!("Affinity waker mutex poisoned!");
                *poisoned.into_inner() = Some(Arc::new(wake));
            }
        }
    }
}
