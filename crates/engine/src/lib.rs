pub mod command;
pub mod coordinator;
pub mod dispatcher;
pub mod notification;
pub mod store;
pub mod user;
