pub mod aggregator;
pub mod hll;

#[cfg(test)]
mod aggregator_test;
#[cfg(test)]
mod hll_test;

pub use aggregator::MeasureState;
pub use hll::HllCounter;
