//! Rate control: token bucket and throttled sources.

pub mod bandwidth;
pub mod throttled;

pub use bandwidth::TokenBucket;
pub use throttled::ThrottledSource;
