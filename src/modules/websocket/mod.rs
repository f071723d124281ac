//! Real-time channel: one session actor per socket, a single server actor that
//! owns the user and room maps, and [`notifier::Notifier`] for services to push events.
pub mod events;
pub mod handler;
pub mod message;
pub mod notifier;
pub mod server;
pub mod session;
