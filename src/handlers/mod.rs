pub mod index_handler;
pub mod oauth;

pub use index_handler::index_handler;
pub use oauth::callback_handler;
