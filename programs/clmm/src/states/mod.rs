pub mod config;
pub mod events;
pub mod pool;
pub mod position;
pub mod tick;
pub mod tick_bitmap;

pub use config::*;
pub use events::*;
pub use pool::*;
pub use position::*;
pub use tick::*;
pub use tick_bitmap::*;
