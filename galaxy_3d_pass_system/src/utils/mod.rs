//! Generic data structures shared by the pass system

mod range_map;

pub use range_map::SubresourceRangeMap;
