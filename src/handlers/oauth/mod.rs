pub mod callback_handler;
pub mod provider_client;

pub use callback_handler::callback_handler;
