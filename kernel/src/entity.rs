mod booking;
mod common;
mod user;
mod vehicle;

pub use self::{booking::*, common::*, user::*, vehicle::*};
