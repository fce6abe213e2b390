pub mod tabular;
pub mod types;

pub use tabular::{read_records, read_records_from_path, write_scored, write_scored_to_path};
pub use types::{RecordRejected, UnifiedRow};
