//! Stats module - indicator comparison and correlation

mod comparator;
mod correlation;

pub use comparator::{ChangeRecord, CompareError, IndicatorComparator, RankDirection, StateValue};
pub use correlation::{CorrelationBuilder, CorrelationError, CorrelationMatrix};
