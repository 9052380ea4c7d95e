//! External muxer process wiring and status parsing

pub mod pipeline;
pub mod status;

pub use pipeline::MuxPipeline;
pub use status::MuxStatus;
