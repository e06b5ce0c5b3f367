pub mod models;
pub mod services;

pub use models::*;
pub use services::availability::AvailabilityService;
pub use services::booking::BookingService;
pub use services::fallback;
