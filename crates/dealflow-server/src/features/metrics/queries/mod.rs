pub mod deal_segments;

pub use deal_segments::DealSegmentsResponse;
