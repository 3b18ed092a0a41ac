mod batcher;
mod data_object_fabricator;
mod stop_signal;

pub use batcher::Batches;
pub use data_object_fabricator::DataObjectFabricator;
pub use stop_signal::StopSignal;
