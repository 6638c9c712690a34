use thiserror::Error;

use crate::TalkId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("item at position {index} has no start time")]
    Unscheduled { index: usize },

    #[error("item at position {index} starts before the item preceding it")]
    Unsorted { index: usize },

    #[error("talk {talk} has no start time")]
    UnscheduledTalk { talk: TalkId },

    #[error("slot width must be positive, got {seconds}s")]
    InvalidSlotWidth { seconds: i64 },
}
