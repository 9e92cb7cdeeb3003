pub mod bands;
pub mod candle;
pub mod signal;
pub mod touch;

pub use bands::*;
pub use candle::*;
pub use signal::*;
pub use touch::*;
