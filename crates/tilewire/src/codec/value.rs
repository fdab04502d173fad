//! Wire codec for the property Value sub-message.
//!
//! A Value message carries exactly one of seven fields; which field is
//! present selects the variant. Decoding borrows string payloads from
//! the input buffer.

use crate::codec::primitives::{zigzag_decode, zigzag_encode, Reader, WireType, Writer};
use crate::error::ProtocolError;
use crate::model::value::{PropertyValue, ValueView};

// Value message fields (vector tile schema)
const VALUE_STRING: u32 = 1;
const VALUE_FLOAT: u32 = 2;
const VALUE_DOUBLE: u32 = 3;
const VALUE_INT: u32 = 4;
const VALUE_UINT: u32 = 5;
const VALUE_SINT: u32 = 6;
const VALUE_BOOL: u32 = 7;

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one Value sub-message into a borrowed view (zero-copy).
///
/// Exactly one of the seven value fields must be present. A second value
/// field, a value field with the wrong wire type, a bool payload other
/// than 0 or 1, or a message with no value field at all fail with
/// [`ProtocolError::InvalidPropertyValue`]. Unrecognized field numbers
/// with a valid wire type are skipped.
pub fn decode_value(data: &[u8]) -> Result<ValueView<'_>, ProtocolError> {
    let mut reader = Reader::new(data);
    let mut value: Option<ValueView> = None;

    while !reader.is_empty() {
        let (field, wire) = reader.read_tag("value")?;
        let decoded = match field {
            VALUE_STRING => {
                expect_wire(wire, WireType::Len, "string_value must be length-delimited")?;
                Some(ValueView::String(reader.read_str("string_value")?))
            }
            VALUE_FLOAT => {
                expect_wire(wire, WireType::Fixed32, "float_value must be 32-bit fixed")?;
                Some(ValueView::Float(reader.read_f32("float_value")?))
            }
            VALUE_DOUBLE => {
                expect_wire(wire, WireType::Fixed64, "double_value must be 64-bit fixed")?;
                Some(ValueView::Double(reader.read_f64("double_value")?))
            }
            VALUE_INT => {
                expect_wire(wire, WireType::Varint, "int_value must be a varint")?;
                Some(ValueView::Int(reader.read_varint("int_value")? as i64))
            }
            VALUE_UINT => {
                expect_wire(wire, WireType::Varint, "uint_value must be a varint")?;
                Some(ValueView::Uint(reader.read_varint("uint_value")?))
            }
            VALUE_SINT => {
                expect_wire(wire, WireType::Varint, "sint_value must be a varint")?;
                Some(ValueView::Sint(zigzag_decode(reader.read_varint("sint_value")?)))
            }
            VALUE_BOOL => {
                expect_wire(wire, WireType::Varint, "bool_value must be a varint")?;
                match reader.read_varint("bool_value")? {
                    0 => Some(ValueView::Bool(false)),
                    1 => Some(ValueView::Bool(true)),
                    _ => {
                        return Err(ProtocolError::InvalidPropertyValue {
                            context: "bool_value payload is not 0 or 1",
                        });
                    }
                }
            }
            _ => {
                reader.skip_field(wire, "value")?;
                None
            }
        };

        if let Some(v) = decoded {
            if value.is_some() {
                return Err(ProtocolError::InvalidPropertyValue {
                    context: "more than one value field present",
                });
            }
            value = Some(v);
        }
    }

    value.ok_or(ProtocolError::InvalidPropertyValue {
        context: "no value field present",
    })
}

fn expect_wire(
    actual: WireType,
    expected: WireType,
    context: &'static str,
) -> Result<(), ProtocolError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ProtocolError::InvalidPropertyValue { context })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a property value into a Value message body.
///
/// The returned bytes double as the canonical surrogate key for value
/// deduplication: equal values encode to equal bytes.
pub fn encode_value(value: &PropertyValue) -> Vec<u8> {
    let mut writer = Writer::new();
    write_value_body(value, &mut writer);
    writer.into_bytes()
}

/// Writes a Value message body into an existing writer.
pub(crate) fn write_value_body(value: &PropertyValue, writer: &mut Writer) {
    match value {
        PropertyValue::String(s) => writer.write_len_field(VALUE_STRING, s.as_bytes()),
        PropertyValue::Float(v) => writer.write_f32_field(VALUE_FLOAT, *v),
        PropertyValue::Double(v) => writer.write_f64_field(VALUE_DOUBLE, *v),
        PropertyValue::Int(v) => writer.write_varint_field(VALUE_INT, *v as u64),
        PropertyValue::Uint(v) => writer.write_varint_field(VALUE_UINT, *v),
        PropertyValue::Sint(v) => writer.write_varint_field(VALUE_SINT, zigzag_encode(*v)),
        PropertyValue::Bool(v) => writer.write_varint_field(VALUE_BOOL, u64::from(*v)),
    }
}
