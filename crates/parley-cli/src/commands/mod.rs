pub mod chat;
pub mod chats;
