mod interval;

pub use interval::{FrameGroup, IntervalError, IntervalTable, find_interval};
