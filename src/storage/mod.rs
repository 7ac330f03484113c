pub mod channel;
pub mod gateway;
pub mod kv;
pub mod sample;
