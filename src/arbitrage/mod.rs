pub mod filter;
pub mod query;
pub mod stake;

pub use filter::{filter_opportunities, FilterCriteria, FilterOptions};
pub use query::{decode_query, FilterHistory};
pub use stake::StakePlan;
