//! The zodiac signs and their horoscope descriptions.

use std::{fmt::Display, str::FromStr};

use crate::Error;

/// One of the twelve signs of the zodiac.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZodiacSign {
    /// Aries
    Aries,
    /// Taurus
    Taurus,
    /// Gemini
    Gemini,
    /// Cancer
    Cancer,
    /// Leo
    Leo,
    /// Virgo
    Virgo,
    /// Libra
    Libra,
    /// Scorpio
    Scorpio,
    /// Sagittarius
    Sagittarius,
    /// Capricorn
    Capricorn,
    /// Aquarius
    Aquarius,
    /// Pisces
    Pisces,
}

impl ZodiacSign {
    /// Every sign, in zodiac order.
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// The lowercase key used to look up the sign.
    pub fn key(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "aries",
            ZodiacSign::Taurus => "taurus",
            ZodiacSign::Gemini => "gemini",
            ZodiacSign::Cancer => "cancer",
            ZodiacSign::Leo => "leo",
            ZodiacSign::Virgo => "virgo",
            ZodiacSign::Libra => "libra",
            ZodiacSign::Scorpio => "scorpio",
            ZodiacSign::Sagittarius => "sagittarius",
            ZodiacSign::Capricorn => "capricorn",
            ZodiacSign::Aquarius => "aquarius",
            ZodiacSign::Pisces => "pisces",
        }
    }

    /// Today's horoscope for the sign.
    pub fn description(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Today is a good day to assert yourself and take action.",
            ZodiacSign::Taurus => "Focus on stability and comfort today.",
            ZodiacSign::Gemini => "Communication is key today. Speak your mind.",
            ZodiacSign::Cancer => "Take care of your emotional well-being.",
            ZodiacSign::Leo => "Your charisma shines bright today!",
            ZodiacSign::Virgo => "Be detail-oriented and help others.",
            ZodiacSign::Libra => "Seek harmony in your relationships.",
            ZodiacSign::Scorpio => "You may feel intense—channel it wisely.",
            ZodiacSign::Sagittarius => "Explore something new today!",
            ZodiacSign::Capricorn => "Stay disciplined—progress is near.",
            ZodiacSign::Aquarius => "Innovate and break the mold.",
            ZodiacSign::Pisces => "Follow your intuition today.",
        }
    }
}

impl FromStr for ZodiacSign {
    type Err = Error;

    /// Parse a sign, ignoring case.
    ///
    /// # Errors
    /// Returns [Error::UnknownSign] if `s` is not the name of a zodiac sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase();

        ZodiacSign::ALL
            .into_iter()
            .find(|sign| sign.key() == key)
            .ok_or_else(|| Error::UnknownSign(s.to_owned()))
    }
}

impl Display for ZodiacSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
