/// Network adapters for remote bucket access
mod bucket_file_source;

pub use bucket_file_source::BucketFileSource;
