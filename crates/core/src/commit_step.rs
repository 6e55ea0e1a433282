/// The three-valued commit-step marker that linearises a block-import
/// transaction across block storage, state storage and spool publication
/// (§3.3, §4.6).
///
/// Absence of the marker on disk is represented by `Option<CommitStep>` at
/// call sites, not by a fourth variant here: "no commit in progress" and
/// "value 0" are different things even though both mean the previous step
/// hasn't happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u64)]
pub enum CommitStep {
    BlocksWritten = 0,
    StateWritten = 1,
    AllUpdated = 2,
}

impl CommitStep {
    pub fn as_u64(self) -> u64 {
        self as u64
    }

    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::BlocksWritten),
            1 => Some(Self::StateWritten),
            2 => Some(Self::AllUpdated),
            _ => None,
        }
    }

    /// The marker value to write next in the canonical §4.6 sequence, or
    /// `None` once `AllUpdated` has been reached (the marker is deleted
    /// instead).
    pub fn next(self) -> Option<Self> {
        match self {
            Self::BlocksWritten => Some(Self::StateWritten),
            Self::StateWritten => Some(Self::AllUpdated),
            Self::AllUpdated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u64() {
        for step in [
            CommitStep::BlocksWritten,
            CommitStep::StateWritten,
            CommitStep::AllUpdated,
        ] {
            assert_eq!(CommitStep::from_u64(step.as_u64()), Some(step));
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(CommitStep::from_u64(3), None);
        assert_eq!(CommitStep::from_u64(u64::MAX), None);
    }

    #[test]
    fn next_progresses_monotonically_then_stops() {
        assert_eq!(CommitStep::BlocksWritten.next(), Some(CommitStep::StateWritten));
        assert_eq!(CommitStep::StateWritten.next(), Some(CommitStep::AllUpdated));
        assert_eq!(CommitStep::AllUpdated.next(), None);
    }
}
