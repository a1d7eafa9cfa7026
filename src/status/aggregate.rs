//! Precedence rules for merging per-child statuses

use crate::kstatus::Status;

/// Aggregates ordered by rank; index is the rank
const BY_RANK: [Status; 3] = [Status::Current, Status::Failed, Status::InProgress];

/// Rank of a child status in the aggregate, `None` if it does not take part
///
/// Unknown children take part in no bucket, so a set of only Unknown
/// children aggregates to Current.
pub fn precedence(status: Status) -> Option<usize> {
    match status {
        Status::InProgress | Status::Terminating => Some(2),
        Status::Failed => Some(1),
        Status::Current => Some(0),
        Status::Unknown => None,
    }
}

/// Merge child statuses into a single aggregate status
///
/// Any InProgress or Terminating child makes the aggregate InProgress;
/// otherwise any Failed child makes it Failed; otherwise it is Current.
pub fn aggregate_status<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    statuses
        .into_iter()
        .filter_map(precedence)
        .max()
        .map(|rank| BY_RANK[rank])
        .unwrap_or(Status::Current)
}
