pub mod source;

pub use source::{MarketNoise, PriceNoise, SignalSource, SmaSignalSource};
