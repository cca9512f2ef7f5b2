mod reading;
mod room;

pub use reading::*;
pub use room::*;
