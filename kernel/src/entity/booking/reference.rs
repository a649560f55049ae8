use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Customer facing booking number, e.g. `K7Q2M9XA`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookingReference(String);

impl BookingReference {
    pub const LENGTH: usize = 8;
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LENGTH && self.0.bytes().all(|b| Self::ALPHABET.contains(&b))
    }
}

#[cfg(test)]
mod test {
    use super::BookingReference;

    #[test]
    fn well_formed_references() {
        assert!(BookingReference::new("AB12CD34").is_well_formed());
        assert!(!BookingReference::new("ab12cd34").is_well_formed());
        assert!(!BookingReference::new("AB12CD3").is_well_formed());
        assert!(!BookingReference::new("AB12-D34").is_well_formed());
    }
}
