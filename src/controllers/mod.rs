pub mod scheduling_board;

pub use scheduling_board::SchedulingBoard;
