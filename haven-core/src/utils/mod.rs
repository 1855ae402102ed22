pub mod clock;
pub mod logbook;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logbook::Logbook;
