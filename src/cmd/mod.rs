pub mod info;
pub mod output;
pub mod resolve;
