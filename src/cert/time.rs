//! ASN.1 `UTCTime` / `GeneralizedTime` values as they appear in a certificate's
//! validity window.
//!
//! Values are kept in their textual form so that whatever was parsed or set
//! is encoded back unchanged. A zero-length value stands for a field that was
//! never set.

use std::sync::LazyLock;

use der::asn1::Any;
use der::{Tag, Tagged};
use regex::Regex;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Result, X509KitError};

static GENERALIZED_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})([0-9]{2})(?:Z|([+-])([0-9]{2})([0-9]{2}))$")
        .expect("static regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asn1TimeKind {
    /// Two-digit year form.
    Utc,
    /// Four-digit year form.
    Generalized,
}

/// A time value as stored in a certificate or CRL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asn1Time {
    kind: Asn1TimeKind,
    text: String,
}

impl Default for Asn1Time {
    fn default() -> Self {
        Self::unset()
    }
}

/// Broken-down fields of a generalized time string.
struct Fields {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    offset: Option<(i8, u8, u8)>,
}

fn parse_fields(value: &str) -> Result<Fields> {
    let invalid = || X509KitError::InvalidTime(value.to_string());
    let caps = GENERALIZED_TIME.captures(value).ok_or_else(invalid)?;
    let num = |i: usize| -> Result<u16> {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(invalid)
    };

    let offset = match caps.get(7) {
        Some(sign) => {
            let sign = if sign.as_str() == "-" { -1 } else { 1 };
            Some((sign, num(8)? as u8, num(9)? as u8))
        }
        None => None,
    };
    let fields = Fields {
        year: i32::from(num(1)?),
        month: num(2)? as u8,
        day: num(3)? as u8,
        hour: num(4)? as u8,
        minute: num(5)? as u8,
        second: num(6)? as u8,
        offset,
    };

    let in_range = (1..=12).contains(&fields.month)
        && (1..=31).contains(&fields.day)
        && fields.hour <= 23
        && fields.minute <= 59
        && fields.second <= 59
        && fields
            .offset
            .is_none_or(|(_, hours, minutes)| hours <= 12 && minutes <= 59);
    if !in_range {
        return Err(invalid());
    }
    Ok(fields)
}

impl Asn1Time {
    /// A time that has never been set.
    pub fn unset() -> Self {
        Asn1Time {
            kind: Asn1TimeKind::Utc,
            text: String::new(),
        }
    }

    /// Accepts `YYYYMMDDhhmmssZ`, `YYYYMMDDhhmmss+hhmm` or `YYYYMMDDhhmmss-hhmm`
    /// and stores it as a `GeneralizedTime`.
    ///
    /// # Errors
    /// `InvalidTime` if the string does not follow that grammar or a field is out of range.
    pub fn from_generalized(value: &str) -> Result<Self> {
        parse_fields(value)?;
        Ok(Asn1Time {
            kind: Asn1TimeKind::Generalized,
            text: value.to_string(),
        })
    }

    /// Encodes an instant, using `UTCTime` for years 1950 through 2049 and
    /// `GeneralizedTime` otherwise.
    pub fn from_offset_date_time(instant: OffsetDateTime) -> Result<Self> {
        let utc = instant.to_offset(UtcOffset::UTC);
        let year = utc.year();
        if !(0..=9999).contains(&year) {
            return Err(X509KitError::InvalidInput(format!(
                "year {} cannot be encoded as an ASN.1 time",
                year
            )));
        }
        let rest = format!(
            "{:02}{:02}{:02}{:02}{:02}Z",
            utc.month() as u8,
            utc.day(),
            utc.hour(),
            utc.minute(),
            utc.second()
        );
        Ok(if (1950..2050).contains(&year) {
            Asn1Time {
                kind: Asn1TimeKind::Utc,
                text: format!("{:02}{}", year % 100, rest),
            }
        } else {
            Asn1Time {
                kind: Asn1TimeKind::Generalized,
                text: format!("{:04}{}", year, rest),
            }
        })
    }

    pub fn is_set(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn kind(&self) -> Asn1TimeKind {
        self.kind
    }

    /// The stored text, exactly as encoded.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The value in generalized form, or `None` when unset.
    ///
    /// `UTCTime` values get their century from the two-digit year:
    /// 50 through 99 map to 19xx, 00 through 49 to 20xx.
    pub fn to_generalized(&self) -> Result<Option<String>> {
        if self.text.is_empty() {
            return Ok(None);
        }
        match self.kind {
            Asn1TimeKind::Generalized => Ok(Some(self.text.clone())),
            Asn1TimeKind::Utc => {
                let yy: u8 = self
                    .text
                    .get(..2)
                    .filter(|yy| yy.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|yy| yy.parse().ok())
                    .ok_or_else(|| X509KitError::InvalidTime(self.text.clone()))?;
                let century = if yy >= 50 { "19" } else { "20" };
                Ok(Some(format!("{}{}", century, self.text)))
            }
        }
    }

    /// The instant this value denotes, or `None` when unset.
    pub fn to_offset_date_time(&self) -> Result<Option<OffsetDateTime>> {
        let Some(text) = self.to_generalized()? else {
            return Ok(None);
        };
        let invalid = || X509KitError::InvalidTime(text.clone());
        let fields = parse_fields(&text)?;

        let month = Month::try_from(fields.month).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(fields.year, month, fields.day).map_err(|_| invalid())?;
        let time = Time::from_hms(fields.hour, fields.minute, fields.second).map_err(|_| invalid())?;
        let offset = match fields.offset {
            None => UtcOffset::UTC,
            Some((sign, hours, minutes)) => UtcOffset::from_hms(
                sign * hours as i8,
                sign * minutes as i8,
                0,
            )
            .map_err(|_| invalid())?,
        };
        Ok(Some(
            PrimitiveDateTime::new(date, time)
                .assume_offset(offset)
                .to_offset(UtcOffset::UTC),
        ))
    }

    pub(crate) fn to_any(&self) -> Result<Any> {
        let tag = match self.kind {
            Asn1TimeKind::Utc => Tag::UtcTime,
            Asn1TimeKind::Generalized => Tag::GeneralizedTime,
        };
        Ok(Any::new(tag, self.text.as_bytes())?)
    }

    pub(crate) fn from_any(any: &Any) -> Result<Self> {
        let kind = match any.tag() {
            Tag::UtcTime => Asn1TimeKind::Utc,
            Tag::GeneralizedTime => Asn1TimeKind::Generalized,
            other => {
                return Err(X509KitError::DecodingError(format!(
                    "expected a time, found {}",
                    other
                )));
            }
        };
        let text = String::from_utf8(any.value().to_vec())
            .map_err(|e| X509KitError::DecodingError(e.to_string()))?;
        Ok(Asn1Time { kind, text })
    }
}
