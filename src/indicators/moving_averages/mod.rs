pub mod dema;
pub mod ema;
pub mod ma;
pub mod sma;
pub mod tema;
pub mod trima;
pub mod wma;

pub use dema::{dema_into, dema_lookback, DemaParams};
pub use ema::{ema_into, ema_lookback, EmaParams};
pub use ma::{ma_into, ma_lookback, MaParams, MaType};
pub use sma::{sma_into, sma_lookback, SmaParams};
pub use tema::{tema_into, tema_lookback, TemaParams};
pub use trima::{trima_into, trima_lookback, TrimaParams};
pub use wma::{wma_into, wma_lookback, WmaParams};
