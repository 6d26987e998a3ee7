pub mod availability;
pub mod booking;
pub mod lifecycle;
pub mod repository;
pub mod supabase_repository;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use repository::{AppointmentRepository, InMemoryAppointmentRepository};
pub use supabase_repository::SupabaseAppointmentRepository;
