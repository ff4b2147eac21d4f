pub mod bulletin;
pub mod timeseries;
