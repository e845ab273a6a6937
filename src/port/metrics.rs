/// Metrics sink updated by the dispatcher and the workers
///
/// Fire-and-forget: nothing in dispatch reads these back, so a sink that drops
/// everything is always valid.
pub trait Metrics: Send + Sync + 'static {
    /// A submission entered the queue
    fn work_accepted(&self);

    /// A submission was dropped because the queue was full
    fn work_rejected(&self);

    /// A worker finished an item
    fn work_completed(&self);

    /// A worker asked for work while the queue was empty
    fn asked_for_work_while_idle(&self);

    /// The periodic tick had to prod the feeder
    fn prod_for_work(&self);

    /// Current queue depth, reported after every change
    fn observe_queue_depth(&self, depth: usize);
}
