pub mod backend;
pub mod ledger;
pub mod openai;
pub mod queue;
pub mod render;
pub mod storage;
