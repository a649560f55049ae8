mod booking;
mod reference;

pub use self::{booking::*, reference::*};
