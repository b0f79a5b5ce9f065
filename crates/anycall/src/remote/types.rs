// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Messages exchanged across the call boundary.

use crate::codec::{self, Cursor, Writer};
use crate::error::{Error, ErrorKind, Result};
use crate::future::Future;
use crate::signature::Signature;
use crate::types::{FromValue, IntoValue, TypeDescriptor, Typed, Value, ValueRef};
use std::time::Duration;

/// Outcome of a remote call as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CallStatus {
    /// Payload is the dynamic-encoded result.
    #[default]
    Ok = 0,
    /// Payload is an encoded `(Cs)`: error kind code and message.
    Error = 1,
    /// Empty payload.
    Canceled = 2,
}

impl CallStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Error),
            2 => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// `(member id, argument signature, encoded arguments)`.
///
/// Used for method calls and for signal events travelling back to
/// subscribers; `method_id` then holds the signal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub method_id: u32,
    pub signature: Signature,
    pub payload: Vec<u8>,
}

impl CallRequest {
    /// Encode `args` for member `method_id`.
    pub fn new(method_id: u32, args: &[Value]) -> Result<Self> {
        let (signature, payload) = codec::encode_args(args)?;
        Ok(Self {
            method_id,
            signature,
            payload,
        })
    }

    /// Decoded argument list.
    pub fn arguments(&self) -> Result<Vec<Value>> {
        codec::decode_args(&self.signature, &self.payload)
    }

    /// Frame layout: `u32` id, prefixed signature text, prefixed payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Writer::with_capacity(12 + self.signature.as_str().len() + self.payload.len());
        out.write_u32_le(self.method_id);
        out.write_prefixed(self.signature.as_str().as_bytes())?;
        out.write_prefixed(&self.payload)?;
        Ok(out.into_inner())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let method_id = cursor.read_u32_le()?;
        let offset = cursor.offset();
        let text = std::str::from_utf8(cursor.read_prefixed()?)
            .map_err(|e| Error::deserialization(offset, e))?;
        let signature =
            Signature::parse(text).map_err(|e| Error::deserialization(offset, e.message()))?;
        let payload = cursor.read_prefixed()?.to_vec();
        ensure_consumed(&cursor)?;
        Ok(Self {
            method_id,
            signature,
            payload,
        })
    }
}

/// `(status, payload)` answer to a [`CallRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallReply {
    pub status: CallStatus,
    pub payload: Vec<u8>,
}

impl CallReply {
    pub fn success(value: &Value) -> Result<Self> {
        Ok(Self {
            status: CallStatus::Ok,
            payload: codec::encode(&Value::dynamic(value.clone()))?,
        })
    }

    pub fn failure(error: &Error) -> Self {
        let detail = Value::tuple(vec![
            Value::from(error.kind().code()),
            Value::from(error.message()),
        ]);
        let payload = codec::encode(&detail).unwrap_or_else(|e| {
            log::error!("[remote] cannot encode error reply: {}", e);
            Vec::new()
        });
        Self {
            status: CallStatus::Error,
            payload,
        }
    }

    pub fn canceled() -> Self {
        Self {
            status: CallStatus::Canceled,
            payload: Vec::new(),
        }
    }

    /// Reply describing a finished future.
    pub fn from_outcome(done: &Future) -> Self {
        match done.value(Some(Duration::ZERO)) {
            Ok(value) => Self::success(&value).unwrap_or_else(|e| Self::failure(&e)),
            Err(e) if e.kind() == ErrorKind::Canceled => Self::canceled(),
            Err(e) => Self::failure(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Ok
    }

    /// Decode the reply back into the call outcome.
    pub fn into_result(self) -> Result<Value> {
        match self.status {
            CallStatus::Ok => {
                let value = codec::decode(&TypeDescriptor::dynamic(), &self.payload)?;
                Ok(match value.dynamic_inner() {
                    Some(inner) => inner.to_owned(),
                    None => value,
                })
            }
            CallStatus::Error => {
                let desc = TypeDescriptor::tuple(&[TypeDescriptor::uint8(), TypeDescriptor::string()]);
                let detail = codec::decode(&desc, &self.payload)?;
                let (code, message): (u8, String) = detail.to()?;
                Err(Error::new(ErrorKind::from_code(code), message))
            }
            CallStatus::Canceled => Err(Error::canceled()),
        }
    }

    /// Frame layout: `u8` status, prefixed payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Writer::with_capacity(5 + self.payload.len());
        out.write_u8(self.status.as_u8());
        out.write_prefixed(&self.payload)?;
        Ok(out.into_inner())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let code = cursor.read_u8()?;
        let status = CallStatus::from_u8(code).ok_or_else(|| {
            Error::deserialization(0, format!("unknown reply status {}", code))
        })?;
        let payload = cursor.read_prefixed()?.to_vec();
        ensure_consumed(&cursor)?;
        Ok(Self { status, payload })
    }
}

fn ensure_consumed(cursor: &Cursor<'_>) -> Result<()> {
    if cursor.is_eof() {
        Ok(())
    } else {
        Err(Error::deserialization(
            cursor.offset(),
            format!("{} trailing bytes", cursor.remaining()),
        ))
    }
}

// Replies travel through futures as `(Cr)` tuples.

impl Typed for CallReply {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::tuple(&[TypeDescriptor::uint8(), TypeDescriptor::raw()])
    }
}

impl IntoValue for CallReply {
    fn into_value(self) -> Value {
        Value::tuple(vec![Value::from(self.status.as_u8()), Value::raw(self.payload)])
    }
}

impl FromValue for CallReply {
    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        let status = u8::try_from(value.element(0)?.as_u64()?).ok()?;
        Some(Self {
            status: CallStatus::from_u8(status)?,
            payload: value.element(1)?.as_raw()?.to_vec(),
        })
    }
}
