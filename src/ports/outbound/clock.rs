use chrono::{DateTime, Utc};

/// Clock port so that lease expiry and run deadlines can be tested
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
