pub mod canonical;
pub mod constants;
pub mod crypto;
pub mod customer;
pub mod params;
pub mod pin_block;
pub mod response_code;
