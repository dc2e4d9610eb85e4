//! Framed streams: a whole output (or input) treated as one top-level sequence.
//!
//! A [StreamEncoder] lets a caller produce the elements of a top-level array one at a time,
//! without materializing them as a collection. A [StreamDecoder] consumes a top-level array
//! element by element; any other top-level value is read as a stream of exactly one element.

use crate::{
    config::{DecodeConfig, EncodeConfig},
    sequence::UNKNOWN_LEN,
    Decode, Decoder, Encode, Encoder, Error, Kind, Next, Reader, Writer,
};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Unopened,
    Opened {
        /// Declared element count, if known.
        expected: Option<usize>,
        count: usize,
    },
    Closed,
}

/// Writes a top-level array one element at a time.
///
/// The stream moves from unopened to opened to closed and never back. The array is begun at
/// most once and ended at most once.
pub struct StreamEncoder<'w> {
    enc: Encoder<'w>,
    state: State,
}

impl<'w> StreamEncoder<'w> {
    pub fn new(writer: &'w mut dyn Writer) -> Self {
        Self::with_config(writer, EncodeConfig::default())
    }

    pub fn with_config(writer: &'w mut dyn Writer, config: EncodeConfig) -> Self {
        Self {
            enc: Encoder::with_config(writer, config),
            state: State::Unopened,
        }
    }

    /// Returns true once the stream has been closed, explicitly or by reaching its count.
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Begins the stream with `count` elements (negative if unknown).
    ///
    /// Opening with a count of zero closes the stream immediately. Opening an already opened
    /// stream does nothing.
    pub fn open(&mut self, count: isize) -> Result<(), Error> {
        match self.state {
            State::Unopened => {}
            State::Opened { .. } => return Ok(()),
            State::Closed => return Err(Error::StreamClosed),
        }
        self.enc.begin_array(count)?;
        let expected = usize::try_from(count).ok();
        trace!(?expected, "stream opened");
        self.state = State::Opened { expected, count: 0 };
        if expected == Some(0) {
            self.close()?;
        }
        Ok(())
    }

    /// Encodes the next element.
    ///
    /// An unopened stream is opened with an unknown length first. Reaching the declared count
    /// closes the stream.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        if self.state == State::Unopened {
            self.open(UNKNOWN_LEN)?;
        }
        let State::Opened { expected, count } = self.state else {
            return Err(Error::StreamClosed);
        };
        if count != 0 {
            self.enc.next_element()?;
        }
        self.enc.encode(value)?;

        let count = count + 1;
        self.state = State::Opened { expected, count };
        if expected == Some(count) {
            self.close()?;
        }
        Ok(())
    }

    /// Ends the stream. Only the first call has an effect.
    ///
    /// Closing a stream that was never opened produces an empty array. Closing a stream opened
    /// with a count before that many elements were encoded still ends the array, but fails with
    /// [Error::ArrayLength].
    pub fn close(&mut self) -> Result<(), Error> {
        let short = match self.state {
            State::Closed => return Ok(()),
            State::Unopened => {
                self.enc.begin_array(0)?;
                None
            }
            State::Opened {
                expected: Some(expected),
                count,
            } if count < expected => Some(Error::ArrayLength {
                expected,
                found: count,
            }),
            State::Opened { .. } => None,
        };
        self.state = State::Closed;
        self.enc.end_array()?;
        trace!(short = short.is_some(), "stream closed");
        short.map_or(Ok(()), Err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Unstarted,
    Array { len: isize, count: usize },
    Single,
    Done,
}

/// Reads a top-level value as a stream of elements.
pub struct StreamDecoder<'r> {
    dec: Decoder<'r>,
    cursor: Cursor,
    len: Option<usize>,
}

impl<'r> StreamDecoder<'r> {
    pub fn new(reader: &'r mut dyn Reader) -> Self {
        Self::with_config(reader, DecodeConfig::default())
    }

    pub fn with_config(reader: &'r mut dyn Reader, config: DecodeConfig) -> Self {
        Self {
            dec: Decoder::with_config(reader, config),
            cursor: Cursor::Unstarted,
            len: None,
        }
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.cursor != Cursor::Unstarted {
            return Ok(());
        }
        if self.dec.kind()? == Kind::Array {
            let len = self.dec.begin_array()?;
            self.len = usize::try_from(len).ok();
            self.cursor = Cursor::Array { len, count: 0 };
        } else {
            self.len = Some(1);
            self.cursor = Cursor::Single;
        }
        trace!(len = ?self.len, "stream started");
        Ok(())
    }

    /// Number of elements in the stream, if the backend knows it in advance.
    pub fn len(&mut self) -> Result<Option<usize>, Error> {
        self.start()?;
        Ok(self.len)
    }

    /// Decodes the next element into `dst`, or returns [Next::End] once the stream is exhausted.
    pub fn decode<T: Decode + ?Sized>(&mut self, dst: &mut T) -> Result<Next, Error> {
        self.start()?;
        match self.cursor {
            Cursor::Unstarted | Cursor::Done => Ok(Next::End),
            Cursor::Single => {
                self.cursor = Cursor::Done;
                self.dec.decode(dst)?;
                Ok(Next::Item)
            }
            Cursor::Array { len, count } => {
                let known = usize::try_from(len).ok();
                let more = match known {
                    Some(n) if count >= n => false,
                    _ if count != 0 || known.is_none() => {
                        self.dec.next_element(count)? == Next::Item
                    }
                    _ => true,
                };
                if !more {
                    self.cursor = Cursor::Done;
                    self.dec.end_array(count)?;
                    trace!(count, "stream exhausted");
                    return Ok(Next::End);
                }
                self.dec.decode(dst)?;
                self.cursor = Cursor::Array {
                    len,
                    count: count + 1,
                };
                Ok(Next::Item)
            }
        }
    }

    /// Decodes the next element into a fresh value.
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: Decode + Default>(&mut self) -> Result<Option<T>, Error> {
        let mut value = T::default();
        match self.decode(&mut value)? {
            Next::Item => Ok(Some(value)),
            Next::End => Ok(None),
        }
    }
}
