pub mod notification;

pub use notification::NotificationService;
