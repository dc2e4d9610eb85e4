//! Encode and Decode for instants and durations.
//!
//! [DateTime<Utc>] and [SystemTime] travel as [Kind::Time]; [TimeDelta] and
//! [std::time::Duration] as [Kind::Duration]. The zero time is the Unix epoch.
//!
//! [Instant] has no wire representation: it is opaque and only meaningful within the process
//! that created it. Both engines reject it before touching the backend.

use crate::{Decode, Decoder, Encode, Encoder, Error, Kind, Shape};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::{Duration, Instant, SystemTime};

fn is_epoch(time: &DateTime<Utc>) -> bool {
    time.timestamp() == 0 && time.timestamp_subsec_nanos() == 0
}

impl Encode for DateTime<Utc> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_time(*self)
    }

    fn is_zero_value(&self) -> bool {
        is_epoch(self)
    }
}

impl Decode for DateTime<Utc> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        *self = match dec.kind()? {
            Kind::Nil => {
                dec.nil()?;
                DateTime::default()
            }
            Kind::Time => dec.time()?,
            Kind::String => DateTime::parse_from_rfc3339(&dec.string()?)
                .map_err(|err| Error::InvalidData("time", err.to_string()))?
                .with_timezone(&Utc),
            kind => return Err(Error::conversion(kind, Kind::Time)),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Time
    }
}

impl Encode for SystemTime {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_time(DateTime::<Utc>::from(*self))
    }

    fn is_zero_value(&self) -> bool {
        *self == SystemTime::UNIX_EPOCH
    }
}

/// `SystemTime` has no `Default`, so it cannot be produced by `from_value`, `from_bytes` or
/// `decode_value`, nor used as a record field. Decode into an existing value instead (e.g.
/// with [crate::value::decode_into] or [Decoder::decode]), or use [DateTime<Utc>].
impl Decode for SystemTime {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        let mut time = DateTime::<Utc>::default();
        time.decode(dec)?;
        *self = time.into();
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Time
    }
}

impl Encode for TimeDelta {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_duration(*self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_zero()
    }

    fn is_zero_value(&self) -> bool {
        self.is_zero()
    }
}

impl Decode for TimeDelta {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        *self = match dec.kind()? {
            Kind::Nil => {
                dec.nil()?;
                TimeDelta::zero()
            }
            Kind::Duration => dec.duration()?,
            Kind::Int => TimeDelta::nanoseconds(dec.int64()?),
            kind => return Err(Error::conversion(kind, Kind::Duration)),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Duration
    }
}

impl Encode for Duration {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        let delta = TimeDelta::from_std(*self)
            .map_err(|err| Error::InvalidData("duration", err.to_string()))?;
        enc.emit_duration(delta)
    }

    fn is_empty_value(&self) -> bool {
        self.is_zero()
    }

    fn is_zero_value(&self) -> bool {
        self.is_zero()
    }
}

impl Decode for Duration {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        let mut delta = TimeDelta::zero();
        delta.decode(dec)?;
        *self = delta
            .to_std()
            .map_err(|err| Error::InvalidData("duration", err.to_string()))?;
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Duration
    }
}

impl Encode for Instant {
    fn encode(&self, _: &mut Encoder<'_>) -> Result<(), Error> {
        Err(Error::Unsupported("std::time::Instant"))
    }
}

impl Decode for Instant {
    fn decode(&mut self, _: &mut Decoder<'_>) -> Result<(), Error> {
        Err(Error::Unsupported("std::time::Instant"))
    }

    fn shape() -> Shape {
        Shape::Unsupported
    }
}
