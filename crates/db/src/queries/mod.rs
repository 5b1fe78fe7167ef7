pub mod channels;
pub mod message_events;
pub mod users;
