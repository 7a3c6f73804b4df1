pub mod rolling_median;
pub mod utils;
