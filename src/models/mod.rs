pub mod event;
pub mod dialogue;
pub mod outcome;

pub type ChatId = String;
pub type ProductId = i64;
pub type Cursor = i64;
