pub mod price_tier;
pub mod push_content;
pub mod user_profile;
