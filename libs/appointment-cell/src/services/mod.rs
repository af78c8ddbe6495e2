pub mod booking;
pub mod rating;

pub use booking::AppointmentBookingService;
pub use rating::RatingService;
