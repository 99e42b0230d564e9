mod record;

pub use record::{IpForm, LookupRecord, NewLookupRecord, VisitorData};
