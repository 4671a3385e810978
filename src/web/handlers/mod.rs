pub mod logs;
pub mod test_trigger;
pub mod webhook;
