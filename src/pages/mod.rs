pub mod explanation;
pub mod home;
pub mod not_found;
