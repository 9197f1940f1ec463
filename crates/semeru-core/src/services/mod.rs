//! Services module

pub mod capacity_page;
pub mod dates;
pub mod poll;
pub mod session;

pub use capacity_page::{find_slot, parse_capacity_page};
pub use dates::{month_number, normalize_local_date, parse_target, parse_year_month, year_month_of};
pub use poll::{
    BackoffConfig, BackoffState, EventCallback, PollConfig, PollEvent, PollLoop, PollPhase,
    SlotEvent, SlotTracker,
};
pub use session::{
    ClientConfig, ExpiryDetector, HttpSession, HttpSessionClient, SessionClient, SessionState,
    REFRESH_AFTER_REQUESTS,
};
