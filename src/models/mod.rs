pub mod completion;
pub mod habit;
pub mod reward;

pub use completion::CompletionEvent;
pub use habit::HabitRecord;
pub use reward::RewardSnapshot;
