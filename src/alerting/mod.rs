pub mod notifier;

pub use notifier::{ChannelNotifier, LogNotifier, Notification, Notifier};
