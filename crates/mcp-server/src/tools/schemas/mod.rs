pub mod ask;
pub mod token_estimate;
