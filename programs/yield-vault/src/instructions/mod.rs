pub mod admin;
pub mod deposit;
pub mod harvest;
pub mod initialize;
pub mod rescue;
pub mod view;
pub mod withdraw;
pub mod wiring;

pub use admin::*;
pub use deposit::*;
pub use harvest::*;
pub use initialize::*;
pub use rescue::*;
pub use view::*;
pub use withdraw::*;
