mod clock;
mod generator;
mod simulator;
mod timetable;

pub use clock::*;
pub use generator::*;
pub use simulator::*;
pub use timetable::*;
