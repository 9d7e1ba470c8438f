/// Job IDs are deterministic strings, see [`crate::job::JobRecord::make_id`].
pub type JobId = String;

/// Owner IDs are opaque strings issued by the identity provider.
pub type OwnerId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
