pub mod pool_state;
pub use pool_state::*;

pub mod trove;
pub use trove::*;

pub mod trove_owners;
pub use trove_owners::*;

pub mod stability_pool_state;
pub use stability_pool_state::*;

pub mod epoch_scale;
pub use epoch_scale::*;

pub mod stability_pool_deposit;
pub use stability_pool_deposit::*;

pub mod coll_surplus_pool;
pub use coll_surplus_pool::*;

pub mod price_feed_state;
pub use price_feed_state::*;

pub mod reward_rate_pool;
pub use reward_rate_pool::*;

pub mod liquidation;
pub use liquidation::*;
