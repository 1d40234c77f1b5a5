pub mod availability;
pub mod booking;
pub mod seat_type;
pub mod slot;

pub use availability::{OpenSlot, SeatAvailability, SlotSeatAvailability};
pub use booking::{Booking, BookingStatus};
pub use seat_type::SeatType;
pub use slot::MovieSlot;
