//! Static daily horoscopes looked up by zodiac sign.

mod domain;
mod endpoint;

pub use domain::ZodiacSign;
pub use endpoint::{HoroscopeReply, horoscope_endpoint};
