//! Binary wire protocol spoken with the accessibility agent.
//!
//! # Packet Structure (Little Endian)
//!
//! ```text
//! [Header: 4 bytes LE u32 len] [OpCode: 1 byte] [Payload: variable]
//! ```
//!
//! `len` counts the opcode and payload, not the header itself.
//!
//! Payload fields:
//!
//! - strings: `u32` LE byte count followed by UTF-8 bytes
//! - optionals: `u8` presence flag (`0` = None, `1` = Some) then the value
//! - coordinates, durations, velocities and slider values: `f64` LE
//! - booleans and orientation codes: a single `u8`
//!
//! # Example
//!
//! ```
//! use autovid_core::protocol::{Request, encode_request, decode_request};
//!
//! let req = Request::TapCoord { x: 195.0, y: 420.0 };
//! let wire = encode_request(&req);
//!
//! // Skip the 4-byte length header to decode
//! assert_eq!(decode_request(&wire[4..]).unwrap(), req);
//! ```

use thiserror::Error;

/// Errors that can occur during protocol encoding or decoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The opcode byte does not correspond to any known operation.
    #[error("invalid opcode: 0x{0:02X}")]
    InvalidOpCode(u8),

    /// The buffer does not contain enough bytes for the expected data.
    #[error("insufficient data in buffer")]
    InsufficientData,

    /// A string field contains invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    Utf8Error,

    /// The payload structure is invalid for the given opcode.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// On-the-wire operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Keep-alive ping (no payload).
    Heartbeat = 0x01,
    /// Tap at absolute coordinates (f64 x, f64 y).
    TapCoord = 0x02,
    /// Tap element by accessibility identifier (string).
    TapElement = 0x03,
    /// Tap element by accessibility label (string).
    TapByLabel = 0x04,
    /// Tap with element type filter (selector + by_label + type).
    TapWithType = 0x05,
    /// Type text via keyboard (string).
    TypeText = 0x06,
    /// Press, drag and release (start, end, press, optional velocity, hold).
    PressDrag = 0x07,
    /// Long press at coordinates (f64 x, f64 y, f64 duration).
    LongPress = 0x09,
    /// Move a slider (selector + by_label + optional type + f64 value).
    AdjustSlider = 0x0A,
    /// Rotate the device (u8 orientation code).
    SetOrientation = 0x0B,
    /// Launch the application under test (bundle id string).
    LaunchApp = 0x0C,
    /// Request a full accessibility tree dump (no payload).
    DumpTree = 0x10,
    /// Error message from the agent (string).
    Error = 0x99,
    /// Generic response (response-type byte + variable data).
    Response = 0xA0,
}

impl OpCode {
    /// Try to convert a raw byte into an `OpCode`.
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        let op = match byte {
            0x01 => OpCode::Heartbeat,
            0x02 => OpCode::TapCoord,
            0x03 => OpCode::TapElement,
            0x04 => OpCode::TapByLabel,
            0x05 => OpCode::TapWithType,
            0x06 => OpCode::TypeText,
            0x07 => OpCode::PressDrag,
            0x09 => OpCode::LongPress,
            0x0A => OpCode::AdjustSlider,
            0x0B => OpCode::SetOrientation,
            0x0C => OpCode::LaunchApp,
            0x10 => OpCode::DumpTree,
            0x99 => OpCode::Error,
            0xA0 => OpCode::Response,
            other => return Err(ProtocolError::InvalidOpCode(other)),
        };
        Ok(op)
    }
}

/// A typed request from the host to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Heartbeat,
    TapCoord { x: f64, y: f64 },
    TapElement { selector: String },
    TapByLabel { label: String },
    TapWithType {
        selector: String,
        by_label: bool,
        element_type: String,
    },
    TypeText { text: String },
    PressDrag {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
        press_secs: f64,
        /// Points per second; `None` lets the agent use its default speed.
        velocity: Option<f64>,
        hold_secs: f64,
    },
    LongPress { x: f64, y: f64, duration: f64 },
    AdjustSlider {
        selector: String,
        by_label: bool,
        element_type: Option<String>,
        value: f64,
    },
    SetOrientation { orientation: u8 },
    LaunchApp { bundle_id: String },
    DumpTree,
}

impl Request {
    /// Short static name for tracing span metadata.
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Request::Heartbeat => "heartbeat",
            Request::TapCoord { .. } => "tap_coord",
            Request::TapElement { .. } => "tap_element",
            Request::TapByLabel { .. } => "tap_by_label",
            Request::TapWithType { .. } => "tap_with_type",
            Request::TypeText { .. } => "type_text",
            Request::PressDrag { .. } => "press_drag",
            Request::LongPress { .. } => "long_press",
            Request::AdjustSlider { .. } => "adjust_slider",
            Request::SetOrientation { .. } => "set_orientation",
            Request::LaunchApp { .. } => "launch_app",
            Request::DumpTree => "dump_tree",
        }
    }
}

/// Response sub-type byte inside the `Response` opcode payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ResponseType {
    Ok = 0x00,
    Error = 0x01,
    Tree = 0x02,
}

impl ResponseType {
    fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x00 => Ok(ResponseType::Ok),
            0x01 => Ok(ResponseType::Error),
            0x02 => Ok(ResponseType::Tree),
            other => Err(ProtocolError::InvalidPayload(format!(
                "unknown response type: 0x{other:02X}"
            ))),
        }
    }
}

/// A typed response from the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The operation completed with no additional data.
    Ok,
    /// The operation failed.
    Error { message: String },
    /// A JSON-encoded accessibility tree (array of root elements).
    Tree { json: String },
}

/// Sequential payload builder.
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new(op: OpCode) -> Self {
        Self { buf: vec![op as u8] }
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn bool(&mut self, v: bool) -> &mut Self {
        self.u8(u8::from(v))
    }

    fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn string(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    fn opt_string(&mut self, s: Option<&str>) -> &mut Self {
        match s {
            None => self.u8(0),
            Some(s) => self.u8(1).string(s),
        }
    }

    fn opt_f64(&mut self, v: Option<f64>) -> &mut Self {
        match v {
            None => self.u8(0),
            Some(v) => self.u8(1).f64(v),
        }
    }

    fn frame(&self) -> Vec<u8> {
        encode_frame(&self.buf)
    }
}

/// Sequential payload reader.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.pos.checked_add(n).ok_or(ProtocolError::InsufficientData)?;
        let slice = self.data.get(self.pos..end).ok_or(ProtocolError::InsufficientData)?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.u8()? != 0)
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn f64(&mut self) -> Result<f64, ProtocolError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::Utf8Error)
    }

    fn opt_string(&mut self) -> Result<Option<String>, ProtocolError> {
        if self.bool()? {
            Ok(Some(self.string()?))
        } else {
            Ok(None)
        }
    }

    fn opt_f64(&mut self) -> Result<Option<f64>, ProtocolError> {
        if self.bool()? {
            Ok(Some(self.f64()?))
        } else {
            Ok(None)
        }
    }
}

/// Prefix `payload` (opcode + data) with its 4-byte LE length.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Read the payload length from a 4-byte LE header.
pub fn read_frame_length(header: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*header)
}

/// Encode a [`Request`] into a complete frame, header included.
pub fn encode_request(req: &Request) -> Vec<u8> {
    match req {
        Request::Heartbeat => Writer::new(OpCode::Heartbeat).frame(),
        Request::TapCoord { x, y } => Writer::new(OpCode::TapCoord).f64(*x).f64(*y).frame(),
        Request::TapElement { selector } => Writer::new(OpCode::TapElement).string(selector).frame(),
        Request::TapByLabel { label } => Writer::new(OpCode::TapByLabel).string(label).frame(),
        Request::TapWithType { selector, by_label, element_type } => Writer::new(OpCode::TapWithType)
            .string(selector)
            .bool(*by_label)
            .string(element_type)
            .frame(),
        Request::TypeText { text } => Writer::new(OpCode::TypeText).string(text).frame(),
        Request::PressDrag { start_x, start_y, end_x, end_y, press_secs, velocity, hold_secs } => {
            Writer::new(OpCode::PressDrag)
                .f64(*start_x)
                .f64(*start_y)
                .f64(*end_x)
                .f64(*end_y)
                .f64(*press_secs)
                .opt_f64(*velocity)
                .f64(*hold_secs)
                .frame()
        }
        Request::LongPress { x, y, duration } => {
            Writer::new(OpCode::LongPress).f64(*x).f64(*y).f64(*duration).frame()
        }
        Request::AdjustSlider { selector, by_label, element_type, value } => {
            Writer::new(OpCode::AdjustSlider)
                .string(selector)
                .bool(*by_label)
                .opt_string(element_type.as_deref())
                .f64(*value)
                .frame()
        }
        Request::SetOrientation { orientation } => {
            Writer::new(OpCode::SetOrientation).u8(*orientation).frame()
        }
        Request::LaunchApp { bundle_id } => Writer::new(OpCode::LaunchApp).string(bundle_id).frame(),
        Request::DumpTree => Writer::new(OpCode::DumpTree).frame(),
    }
}

/// Decode a request from bytes that start at the opcode (header stripped).
pub fn decode_request(data: &[u8]) -> Result<Request, ProtocolError> {
    let mut r = Reader::new(data);
    let req = match OpCode::from_u8(r.u8()?)? {
        OpCode::Heartbeat => Request::Heartbeat,
        OpCode::TapCoord => Request::TapCoord { x: r.f64()?, y: r.f64()? },
        OpCode::TapElement => Request::TapElement { selector: r.string()? },
        OpCode::TapByLabel => Request::TapByLabel { label: r.string()? },
        OpCode::TapWithType => Request::TapWithType {
            selector: r.string()?,
            by_label: r.bool()?,
            element_type: r.string()?,
        },
        OpCode::TypeText => Request::TypeText { text: r.string()? },
        OpCode::PressDrag => Request::PressDrag {
            start_x: r.f64()?,
            start_y: r.f64()?,
            end_x: r.f64()?,
            end_y: r.f64()?,
            press_secs: r.f64()?,
            velocity: r.opt_f64()?,
            hold_secs: r.f64()?,
        },
        OpCode::LongPress => Request::LongPress { x: r.f64()?, y: r.f64()?, duration: r.f64()? },
        OpCode::AdjustSlider => Request::AdjustSlider {
            selector: r.string()?,
            by_label: r.bool()?,
            element_type: r.opt_string()?,
            value: r.f64()?,
        },
        OpCode::SetOrientation => Request::SetOrientation { orientation: r.u8()? },
        OpCode::LaunchApp => Request::LaunchApp { bundle_id: r.string()? },
        OpCode::DumpTree => Request::DumpTree,
        op @ (OpCode::Error | OpCode::Response) => {
            return Err(ProtocolError::InvalidPayload(format!(
                "opcode 0x{:02X} is not a valid request opcode",
                op as u8
            )))
        }
    };
    Ok(req)
}

/// Encode a [`Response`] into a complete frame, header included.
pub fn encode_response(resp: &Response) -> Vec<u8> {
    let mut w = Writer::new(OpCode::Response);
    match resp {
        Response::Ok => w.u8(ResponseType::Ok as u8),
        Response::Error { message } => w.u8(ResponseType::Error as u8).string(message),
        Response::Tree { json } => w.u8(ResponseType::Tree as u8).string(json),
    };
    w.frame()
}

/// Decode a response from bytes that start at the opcode (header stripped).
///
/// Accepts both the `Response` envelope and a bare `Error` opcode.
pub fn decode_response(data: &[u8]) -> Result<Response, ProtocolError> {
    let mut r = Reader::new(data);
    match OpCode::from_u8(r.u8()?)? {
        OpCode::Response => match ResponseType::from_u8(r.u8()?)? {
            ResponseType::Ok => Ok(Response::Ok),
            ResponseType::Error => Ok(Response::Error { message: r.string()? }),
            ResponseType::Tree => Ok(Response::Tree { json: r.string()? }),
        },
        OpCode::Error => Ok(Response::Error { message: r.string()? }),
        op => Err(ProtocolError::InvalidPayload(format!(
            "opcode 0x{:02X} is not a valid response opcode",
            op as u8
        ))),
    }
}
