pub mod claim_set;
pub mod records;
pub mod types;

pub use claim_set::ClaimSet;
pub use records::*;
pub use types::*;
