pub mod date_range;
pub mod graphql;

pub use date_range::{parse_iso_date, DateRange};
