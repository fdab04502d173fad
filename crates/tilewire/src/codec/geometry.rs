//! Geometry command stream decoding and encoding.
//!
//! A geometry is a packed sequence of u32 words: command words packing
//! `(command_id, repeat_count)` and zigzag-encoded parameter words
//! carrying cursor-relative coordinate deltas. Decoding is a single
//! forward pass driven by a per-kind grammar; each emitted point is the
//! running cursor after applying one delta pair.

use crate::codec::primitives::{zigzag_decode32, zigzag_encode32, Reader, Writer};
use crate::error::GeometryError;
use crate::model::geometry::{GeomType, Point};

// Command identifiers
pub(crate) const COMMAND_MOVE_TO: u32 = 1;
pub(crate) const COMMAND_LINE_TO: u32 = 2;
pub(crate) const COMMAND_CLOSE_PATH: u32 = 7;

#[inline]
fn command_id(word: u32) -> u32 {
    word & 0x7
}

#[inline]
fn command_count(word: u32) -> u32 {
    word >> 3
}

#[inline]
pub(crate) fn command_word(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

/// Handler receiving the decoded point stream.
///
/// `begin`/`end` bracket each point run, linestring segment, or polygon
/// ring; `begin` receives the number of points the part will emit.
/// `close` signals ClosePath on a ring: the decoder re-emits nothing
/// itself, the handler decides whether to materialize the closing point.
pub trait GeometryHandler {
    fn begin(&mut self, count: u32) {
        let _ = count;
    }

    fn point(&mut self, point: Point);

    fn close(&mut self) {}

    fn end(&mut self) {}
}

/// Decodes a point geometry: exactly one MoveTo carrying all points.
pub fn decode_point_geometry<H: GeometryHandler>(
    data: &[u8],
    handler: &mut H,
) -> Result<(), GeometryError> {
    decode_points(&mut WordReader::new(data), handler)
}

/// Decodes a linestring geometry: one or more (MoveTo, LineTo) segments.
pub fn decode_linestring_geometry<H: GeometryHandler>(
    data: &[u8],
    handler: &mut H,
) -> Result<(), GeometryError> {
    decode_lines(&mut WordReader::new(data), handler)
}

/// Decodes a polygon geometry: one or more (MoveTo, LineTo, ClosePath) rings.
pub fn decode_polygon_geometry<H: GeometryHandler>(
    data: &[u8],
    handler: &mut H,
) -> Result<(), GeometryError> {
    decode_rings(&mut WordReader::new(data), handler)
}

/// Word-at-a-time view over a packed geometry field, tracking the cursor.
struct WordReader<'a> {
    reader: Reader<'a>,
    cursor: Point,
}

impl<'a> WordReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            cursor: Point::default(),
        }
    }

    fn next_word(&mut self) -> Result<Option<u32>, GeometryError> {
        if self.reader.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.reader.read_varint32("geometry")?))
    }

    /// Reads one delta pair and returns the advanced cursor.
    fn next_point(&mut self) -> Result<Point, GeometryError> {
        let Some(dx) = self.next_word()? else {
            return Err(GeometryError::UnexpectedEnd);
        };
        let Some(dy) = self.next_word()? else {
            return Err(GeometryError::UnexpectedEnd);
        };
        self.cursor.x = self.cursor.x.wrapping_add(zigzag_decode32(dx));
        self.cursor.y = self.cursor.y.wrapping_add(zigzag_decode32(dy));
        Ok(self.cursor)
    }
}

/// Validates a command word independent of its position in the grammar.
fn check_command(word: u32, kind: GeomType) -> Result<(u32, u32), GeometryError> {
    let command = command_id(word);
    let count = command_count(word);
    match command {
        COMMAND_MOVE_TO | COMMAND_LINE_TO => {
            if count == 0 {
                return Err(GeometryError::InvalidCommand { command, count });
            }
        }
        COMMAND_CLOSE_PATH => {
            if kind != GeomType::Polygon || count != 1 {
                return Err(GeometryError::InvalidCommand { command, count });
            }
        }
        _ => return Err(GeometryError::InvalidCommand { command, count }),
    }
    Ok((command, count))
}

fn decode_points<H: GeometryHandler>(
    words: &mut WordReader<'_>,
    handler: &mut H,
) -> Result<(), GeometryError> {
    let Some(word) = words.next_word()? else {
        return Err(GeometryError::InvalidSequence {
            context: "point geometry is empty",
        });
    };
    let (command, count) = check_command(word, GeomType::Point)?;
    if command != COMMAND_MOVE_TO {
        return Err(GeometryError::InvalidSequence {
            context: "point geometry must start with move_to",
        });
    }
    handler.begin(count);
    for _ in 0..count {
        let point = words.next_point()?;
        handler.point(point);
    }
    handler.end();
    if words.next_word()?.is_some() {
        return Err(GeometryError::TrailingData);
    }
    Ok(())
}

fn decode_lines<H: GeometryHandler>(
    words: &mut WordReader<'_>,
    handler: &mut H,
) -> Result<(), GeometryError> {
    let mut segments = 0u32;
    loop {
        let Some(word) = words.next_word()? else {
            if segments == 0 {
                return Err(GeometryError::InvalidSequence {
                    context: "linestring geometry is empty",
                });
            }
            return Ok(());
        };
        let (command, count) = check_command(word, GeomType::Linestring)?;
        if command != COMMAND_MOVE_TO {
            return Err(GeometryError::InvalidSequence {
                context: "linestring segment must start with move_to",
            });
        }
        if count != 1 {
            return Err(GeometryError::InvalidSequence {
                context: "linestring move_to must have count 1",
            });
        }
        let first = words.next_point()?;

        let Some(word) = words.next_word()? else {
            return Err(GeometryError::InvalidSequence {
                context: "linestring segment lacks a line_to",
            });
        };
        let (command, count) = check_command(word, GeomType::Linestring)?;
        if command != COMMAND_LINE_TO {
            return Err(GeometryError::InvalidSequence {
                context: "expected line_to after move_to",
            });
        }
        handler.begin(count + 1);
        handler.point(first);
        for _ in 0..count {
            let point = words.next_point()?;
            handler.point(point);
        }
        handler.end();
        segments += 1;
    }
}

fn decode_rings<H: GeometryHandler>(
    words: &mut WordReader<'_>,
    handler: &mut H,
) -> Result<(), GeometryError> {
    let mut rings = 0u32;
    loop {
        let Some(word) = words.next_word()? else {
            if rings == 0 {
                return Err(GeometryError::InvalidSequence {
                    context: "polygon geometry is empty",
                });
            }
            return Ok(());
        };
        let (command, count) = check_command(word, GeomType::Polygon)?;
        if command != COMMAND_MOVE_TO {
            return Err(GeometryError::InvalidSequence {
                context: "ring must start with move_to",
            });
        }
        if count != 1 {
            return Err(GeometryError::InvalidSequence {
                context: "ring move_to must have count 1",
            });
        }
        let first = words.next_point()?;

        let Some(word) = words.next_word()? else {
            return Err(GeometryError::InvalidSequence {
                context: "ring lacks a line_to",
            });
        };
        let (command, count) = check_command(word, GeomType::Polygon)?;
        if command != COMMAND_LINE_TO {
            return Err(GeometryError::InvalidSequence {
                context: "expected line_to after ring move_to",
            });
        }
        if count < 2 {
            return Err(GeometryError::InvalidSequence {
                context: "ring needs at least 2 line_to points",
            });
        }
        handler.begin(count + 1);
        handler.point(first);
        for _ in 0..count {
            let point = words.next_point()?;
            handler.point(point);
        }

        let Some(word) = words.next_word()? else {
            return Err(GeometryError::InvalidSequence {
                context: "ring lacks a close_path",
            });
        };
        let (command, _) = check_command(word, GeomType::Polygon)?;
        if command != COMMAND_CLOSE_PATH {
            return Err(GeometryError::InvalidSequence {
                context: "expected close_path after ring points",
            });
        }
        handler.close();
        handler.end();
        rings += 1;
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Builder-side encoder producing command and parameter words.
#[derive(Debug, Default)]
pub(crate) struct GeometryEncoder {
    writer: Writer,
    cursor: Point,
}

impl GeometryEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn command(&mut self, id: u32, count: u32) {
        self.writer.write_varint(command_word(id, count) as u64);
    }

    /// Writes one delta pair relative to the cursor and advances it.
    pub(crate) fn point(&mut self, point: Point) {
        let dx = point.x.wrapping_sub(self.cursor.x);
        let dy = point.y.wrapping_sub(self.cursor.y);
        self.writer.write_varint(zigzag_encode32(dx) as u64);
        self.writer.write_varint(zigzag_encode32(dy) as u64);
        self.cursor = point;
    }

    pub(crate) fn close_path(&mut self) {
        self.command(COMMAND_CLOSE_PATH, 1);
    }

    pub(crate) fn data(&self) -> &[u8] {
        self.writer.as_bytes()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }
}
