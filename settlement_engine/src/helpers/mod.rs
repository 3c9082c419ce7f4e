pub mod escrow_split;
pub mod phone;
mod references;

pub use escrow_split::{split, SellerSplit, SplitError};
pub use phone::{parse_network_prefixes, MobileNumber, NetworkPrefix, PhoneError, PhonePolicy};
pub use references::{new_order_reference, new_payment_reference, new_payout_reference};
