pub mod investment;
pub mod time_value;
