mod booking;
mod vehicle;

pub use self::{booking::*, vehicle::*};
