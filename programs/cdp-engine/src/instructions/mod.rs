pub mod init;
pub use init::*;

pub mod init_price_feed;
pub use init_price_feed::*;

pub mod init_trove;
pub use init_trove::*;

pub mod init_epoch_scale;
pub use init_epoch_scale::*;

pub mod set_price;
pub use set_price::*;

pub mod fetch_price;
pub use fetch_price::*;

pub mod open_trove;
pub use open_trove::*;

pub mod adjust_trove;
pub use adjust_trove::*;

pub mod close_trove;
pub use close_trove::*;

pub mod liquidate;
pub use liquidate::*;

pub mod redeem_collateral;
pub use redeem_collateral::*;

pub mod provide_to_sp;
pub use provide_to_sp::*;

pub mod withdraw_from_sp;
pub use withdraw_from_sp::*;

pub mod claim_from_sp;
pub use claim_from_sp::*;

pub mod claim_coll_surplus;
pub use claim_coll_surplus::*;

pub mod views;
pub use views::*;
