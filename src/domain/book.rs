//! Dispatch book - the bounded work queue and the worker registry
//!
//! Pure bookkeeping with no messaging: every operation returns what the owning actor
//! has to do next. An item is either queued, or assigned to exactly one worker, or
//! gone; never queued and assigned at once.

use std::collections::{HashMap, VecDeque};

use crate::domain::work::{Payload, QueuedWork, WorkerId};

/// A registered worker and its current assignment (`None` while idle)
#[derive(Debug, Clone)]
pub struct WorkerRecord<P, H> {
    pub handle:     H,
    pub assignment: Option<QueuedWork<P>>
}

/// Outcome of a worker asking for work
#[derive(Debug)]
pub enum WorkRequest<P, H> {
    /// The worker is not registered
    UnknownWorker,
    /// Nothing queued; the feeder should be asked for more
    QueueEmpty,
    /// The worker already holds an assignment
    AlreadyAssigned,
    /// The queue head now belongs to this worker
    Assigned { worker: H, work: QueuedWork<P> }
}

/// Outcome of removing a worker that stopped
#[derive(Debug, PartialEq, Eq)]
pub enum Termination<P> {
    UnknownWorker,
    Idle,
    /// The worker died holding this item, which must go back through submission
    InFlight(QueuedWork<P>)
}

/// Queue plus registry, exclusively owned by the dispatcher
#[derive(Debug)]
pub struct DispatchBook<P, H> {
    queue:    VecDeque<QueuedWork<P>>,
    capacity: usize,
    workers:  HashMap<WorkerId, WorkerRecord<P, H>>
}

impl<P: Payload, H: Clone> DispatchBook<P, H> {
    pub fn new(capacity: usize) -> Self {
        Self { queue: VecDeque::with_capacity(capacity.min(1024)), capacity, workers: HashMap::new() }
    }

    /// Enqueue at the tail. A full queue hands the work back.
    pub fn offer(&mut self, work: QueuedWork<P>) -> Result<usize, QueuedWork<P>> {
        if self.is_full() {
            return Err(work);
        }
        self.queue.push_back(work);
        Ok(self.queue.len())
    }

    /// Add an idle record. Returns `false` if the worker was already registered.
    pub fn register(&mut self, id: WorkerId, handle: H) -> bool {
        if self.workers.contains_key(&id) {
            return false;
        }
        self.workers.insert(id, WorkerRecord { handle, assignment: None });
        true
    }

    pub fn request(&mut self, id: WorkerId) -> WorkRequest<P, H> {
        let Some(record) = self.workers.get_mut(&id) else {
            return WorkRequest::UnknownWorker;
        };
        if self.queue.is_empty() {
            return WorkRequest::QueueEmpty;
        }
        if record.assignment.is_some() {
            return WorkRequest::AlreadyAssigned;
        }
        match self.queue.pop_front() {
            Some(work) => {
                record.assignment = Some(work.clone());
                WorkRequest::Assigned { worker: record.handle.clone(), work }
            }
            None => WorkRequest::QueueEmpty
        }
    }

    /// Clear a worker's assignment. Returns `false` for an unknown worker.
    pub fn complete(&mut self, id: WorkerId) -> bool {
        match self.workers.get_mut(&id) {
            Some(record) => {
                record.assignment = None;
                true
            }
            None => false
        }
    }

    /// Drop the record unconditionally and hand back any in-flight work
    pub fn terminate(&mut self, id: WorkerId) -> Termination<P> {
        match self.workers.remove(&id) {
            Some(WorkerRecord { assignment: Some(work), .. }) => Termination::InFlight(work),
            Some(_) => Termination::Idle,
            None => Termination::UnknownWorker
        }
    }

    /// Idle workers worth telling that work is ready; empty while the queue is empty
    pub fn workers_to_notify(&self) -> Vec<H> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        self.workers.values().filter(|record| record.assignment.is_none()).map(|record| record.handle.clone()).collect()
    }

    pub fn assignment(&self, id: &WorkerId) -> Option<&QueuedWork<P>> {
        self.workers.get(id).and_then(|record| record.assignment.as_ref())
    }

    pub fn is_registered(&self, id: &WorkerId) -> bool {
        self.workers.contains_key(id)
    }

    pub fn queued(&self) -> impl Iterator<Item = &QueuedWork<P>> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn busy_count(&self) -> usize {
        self.workers.values().filter(|record| record.assignment.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use ractor::ActorId;

    use super::*;

    type Book = DispatchBook<String, &'static str>;

    fn work(payload: &str) -> QueuedWork<String> {
        QueuedWork::anonymous(payload.to_string())
    }

    fn assigned(request: WorkRequest<String, &'static str>) -> (&'static str, QueuedWork<String>) {
        match request {
            WorkRequest::Assigned { worker, work } => (worker, work),
            other => panic!("Expected an assignment, got {:?}", other)
        }
    }

    #[test]
    fn test_backpressure_boundary() {
        let mut book = Book::new(2);

        assert_eq!(book.offer(work("1")), Ok(1));
        assert_eq!(book.offer(work("2")), Ok(2));
        assert_eq!(book.offer(work("3")), Err(work("3")));
        assert_eq!(book.len(), 2);
        assert!(book.is_full());
    }

    #[test]
    fn test_assignment_follows_request_arrival_order() {
        let mut book = Book::new(10);
        let (w1, w2) = (ActorId::Local(1), ActorId::Local(2));
        book.register(w1, "w1");
        book.register(w2, "w2");
        book.offer(work("a")).unwrap();

        let (worker, item) = assigned(book.request(w1));
        assert_eq!(worker, "w1");
        assert_eq!(item, work("a"));
        assert!(matches!(book.request(w2), WorkRequest::QueueEmpty));
        assert_eq!(book.assignment(&w1), Some(&work("a")));
        assert_eq!(book.assignment(&w2), None);
    }

    #[test]
    fn test_queue_is_served_fifo() {
        let mut book = Book::new(10);
        let (w1, w2) = (ActorId::Local(1), ActorId::Local(2));
        book.register(w1, "w1");
        book.register(w2, "w2");
        book.offer(work("a")).unwrap();
        book.offer(work("b")).unwrap();

        assert_eq!(assigned(book.request(w2)).1, work("a"));
        assert_eq!(assigned(book.request(w1)).1, work("b"));
        assert!(book.is_empty());
    }

    #[test]
    fn test_no_double_assignment() {
        let mut book = Book::new(10);
        let w1 = ActorId::Local(1);
        book.register(w1, "w1");
        book.offer(work("a")).unwrap();
        book.offer(work("b")).unwrap();

        assigned(book.request(w1));
        assert!(matches!(book.request(w1), WorkRequest::AlreadyAssigned));
        assert_eq!(book.len(), 1);
        assert_eq!(book.busy_count(), 1);
    }

    #[test]
    fn test_unknown_worker_is_ignored() {
        let mut book = Book::new(10);
        let stranger = ActorId::Local(9);
        book.offer(work("a")).unwrap();

        assert!(matches!(book.request(stranger), WorkRequest::UnknownWorker));
        assert!(!book.complete(stranger));
        assert_eq!(book.terminate(stranger), Termination::UnknownWorker);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut book = Book::new(10);
        let w1 = ActorId::Local(1);
        book.offer(work("a")).unwrap();

        assert!(book.register(w1, "w1"));
        assigned(book.request(w1));
        assert!(!book.register(w1, "w1"));
        assert_eq!(book.assignment(&w1), Some(&work("a")));
    }

    #[test]
    fn test_completion_frees_the_worker() {
        let mut book = Book::new(10);
        let w1 = ActorId::Local(1);
        book.register(w1, "w1");
        book.offer(work("a")).unwrap();
        assigned(book.request(w1));

        assert!(book.complete(w1));
        assert_eq!(book.assignment(&w1), None);
        assert_eq!(book.busy_count(), 0);
        assert!(book.is_registered(&w1));
    }

    #[test]
    fn test_termination_returns_in_flight_work_once() {
        let mut book = Book::new(10);
        let (w1, w2) = (ActorId::Local(1), ActorId::Local(2));
        book.register(w1, "w1");
        book.register(w2, "w2");
        book.offer(work("a")).unwrap();
        assigned(book.request(w1));

        assert_eq!(book.terminate(w1), Termination::InFlight(work("a")));
        assert_eq!(book.terminate(w1), Termination::UnknownWorker);
        assert_eq!(book.terminate(w2), Termination::Idle);
        assert_eq!(book.worker_count(), 0);
    }

    #[test]
    fn test_requeued_work_goes_to_the_tail() {
        let mut book = Book::new(10);
        let w1 = ActorId::Local(1);
        book.register(w1, "w1");
        book.offer(work("a")).unwrap();
        assigned(book.request(w1));
        book.offer(work("b")).unwrap();

        if let Termination::InFlight(lost) = book.terminate(w1) {
            book.offer(lost).unwrap();
        }

        let order: Vec<_> = book.queued().map(|w| w.payload.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_notify_targets_only_idle_workers_and_never_assigns() {
        let mut book = Book::new(10);
        let (w1, w2) = (ActorId::Local(1), ActorId::Local(2));
        book.register(w1, "w1");
        book.register(w2, "w2");
        assert!(book.workers_to_notify().is_empty());

        book.offer(work("a")).unwrap();
        book.offer(work("b")).unwrap();
        let mut targets = book.workers_to_notify();
        targets.sort();
        assert_eq!(targets, vec!["w1", "w2"]);
        assert_eq!(book.len(), 2);

        assigned(book.request(w1));
        assert_eq!(book.workers_to_notify(), vec!["w2"]);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_conservation_under_success() {
        let mut book = Book::new(100);
        let workers: Vec<_> = (0..3).map(ActorId::Local).collect();
        for id in &workers {
            book.register(*id, "w");
        }
        for i in 0..20 {
            book.offer(work(&i.to_string())).unwrap();
        }

        let mut completed = Vec::new();
        while !book.is_empty() {
            for id in &workers {
                if let WorkRequest::Assigned { work, .. } = book.request(*id) {
                    assert!(book.complete(*id));
                    completed.push(work.payload);
                }
            }
        }

        let expected: Vec<_> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(completed, expected);
        assert_eq!(book.busy_count(), 0);
    }
}
