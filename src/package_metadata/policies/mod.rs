mod known_sources;

pub use known_sources::KnownSources;
