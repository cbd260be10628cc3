/// Wall-clock seconds, provided by the hosting runtime. Must be
/// non-decreasing between consecutive operations on the same pool.
pub trait Clock {
    fn now_seconds(&self) -> u64;
}
