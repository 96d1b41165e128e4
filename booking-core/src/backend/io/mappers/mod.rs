pub mod booking_mapper;
pub mod reservation_mapper;
pub mod slot_mapper;
pub mod subscription_mapper;

pub use booking_mapper::BookingMapper;
pub use reservation_mapper::ReservationMapper;
pub use slot_mapper::SlotMapper;
pub use subscription_mapper::SubscriptionMapper;
