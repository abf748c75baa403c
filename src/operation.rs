use crate::dataset::Dataset;
use crate::error::AnalyticsError;

/// Trait for analytics operations.
///
/// This forms the contract between the API layer and the aggregation engine. Operations are
/// synchronous and CPU-bound. They only read the dataset they are given and always build a new
/// result.
pub trait Operation {
    /// Parameters selecting the columns and reduction to use.
    type Params: Send + 'static;

    /// Result of the operation.
    type Output: Send + 'static;

    /// Execute the operation.
    ///
    /// # Arguments
    ///
    /// * `dataset`: Dataset to operate on
    /// * `params`: Operation parameters
    fn execute(dataset: &Dataset, params: &Self::Params) -> Result<Self::Output, AnalyticsError>;
}
