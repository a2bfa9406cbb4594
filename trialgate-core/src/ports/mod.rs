pub mod sink;

pub use sink::BatchSink;
