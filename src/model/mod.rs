pub mod attendance;
pub mod correction;
pub mod sheet;
pub mod student;
pub mod time_period;
