pub mod batch;
pub mod http;
pub mod inflight;
