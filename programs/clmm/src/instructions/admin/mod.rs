pub mod collect_protocol_fee;
pub mod reset_sqrt_price;
pub mod set_pool_status;
pub mod update_fee_rate;
pub mod update_pool_uri;

pub use collect_protocol_fee::*;
pub use reset_sqrt_price::*;
pub use set_pool_status::*;
pub use update_fee_rate::*;
pub use update_pool_uri::*;
