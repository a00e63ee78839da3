pub mod signal;

pub use signal::{Side, Signal};
