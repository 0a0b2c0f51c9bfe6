pub mod catalog;
pub mod evaluation;
pub mod question;
pub mod recommendation;
pub mod user;
