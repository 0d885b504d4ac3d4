//! Response assembly on top of [`serde_json::Value`].
//!
//! The builder enforces the construction protocol at runtime: every call is
//! checked against the current construction state, and an illegal call
//! reports which rule it broke. A finished builder yields exactly one root
//! value.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("key {0:?} outside an open object")]
    KeyOutsideObject(String),
    #[error("key {0:?} while key {1:?} is still pending a value")]
    KeyAlreadyPending(String, String),
    #[error("value inside an object without a pending key")]
    ValueWithoutKey,
    #[error("value after the document is already complete")]
    ValueAfterComplete,
    #[error("end_array without an open array")]
    EndArrayMismatch,
    #[error("end_object without an open object")]
    EndObjectMismatch,
    #[error("end_object while key {0:?} is pending a value")]
    EndObjectWithPendingKey(String),
    #[error("finish on an incomplete document")]
    Incomplete,
}

#[derive(Debug)]
enum Frame {
    Array(Vec<Value>),
    Object {
        entries: Map<String, Value>,
        pending_key: Option<String>,
    },
}

/// Write-once builder for a single JSON value.
///
/// Methods return `&mut Self` so calls chain through `?`:
///
/// ```
/// # use omnibus::json::Builder;
/// # fn demo() -> Result<(), omnibus::json::BuilderError> {
/// let mut builder = Builder::new();
/// builder.start_object()?.key("answer")?.value(42)?.end_object()?;
/// let value = builder.finish()?;
/// # Ok(())
/// # }
/// # demo().unwrap();
/// ```
#[derive(Default, Debug)]
pub struct Builder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the key of the next object entry.
    pub fn key(&mut self, key: impl Into<String>) -> Result<&mut Self, BuilderError> {
        let key = key.into();
        match self.stack.last_mut() {
            Some(Frame::Object {
                pending_key: pending_key @ None,
                ..
            }) => {
                *pending_key = Some(key);
                Ok(self)
            }
            Some(Frame::Object {
                pending_key: Some(pending),
                ..
            }) => Err(BuilderError::KeyAlreadyPending(key, pending.clone())),
            _ => Err(BuilderError::KeyOutsideObject(key)),
        }
    }

    /// Places a complete value at the current position.
    pub fn value(&mut self, value: impl Into<Value>) -> Result<&mut Self, BuilderError> {
        self.place(value.into())?;
        Ok(self)
    }

    pub fn start_array(&mut self) -> Result<&mut Self, BuilderError> {
        self.check_placeable()?;
        self.stack.push(Frame::Array(Vec::new()));
        Ok(self)
    }

    pub fn end_array(&mut self) -> Result<&mut Self, BuilderError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => {
                self.place(Value::Array(items))?;
                Ok(self)
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(BuilderError::EndArrayMismatch)
            }
            None => Err(BuilderError::EndArrayMismatch),
        }
    }

    pub fn start_object(&mut self) -> Result<&mut Self, BuilderError> {
        self.check_placeable()?;
        self.stack.push(Frame::Object {
            entries: Map::new(),
            pending_key: None,
        });
        Ok(self)
    }

    pub fn end_object(&mut self) -> Result<&mut Self, BuilderError> {
        match self.stack.pop() {
            Some(Frame::Object {
                entries,
                pending_key: None,
            }) => {
                self.place(Value::Object(entries))?;
                Ok(self)
            }
            Some(Frame::Object {
                entries,
                pending_key: Some(pending),
            }) => {
                let error = BuilderError::EndObjectWithPendingKey(pending.clone());
                self.stack.push(Frame::Object {
                    entries,
                    pending_key: Some(pending),
                });
                Err(error)
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(BuilderError::EndObjectMismatch)
            }
            None => Err(BuilderError::EndObjectMismatch),
        }
    }

    /// Consumes the builder and returns the completed root value.
    pub fn finish(self) -> Result<Value, BuilderError> {
        if !self.stack.is_empty() {
            return Err(BuilderError::Incomplete);
        }
        self.root.ok_or(BuilderError::Incomplete)
    }

    /// A value or container may start here iff `place` would accept it.
    fn check_placeable(&self) -> Result<(), BuilderError> {
        match self.stack.last() {
            None if self.root.is_some() => Err(BuilderError::ValueAfterComplete),
            None => Ok(()),
            Some(Frame::Array(_)) => Ok(()),
            Some(Frame::Object {
                pending_key: Some(_),
                ..
            }) => Ok(()),
            Some(Frame::Object {
                pending_key: None, ..
            }) => Err(BuilderError::ValueWithoutKey),
        }
    }

    fn place(&mut self, value: Value) -> Result<(), BuilderError> {
        match self.stack.last_mut() {
            None if self.root.is_some() => Err(BuilderError::ValueAfterComplete),
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Object {
                entries,
                pending_key,
            }) => match pending_key.take() {
                Some(key) => {
                    entries.insert(key, value);
                    Ok(())
                }
                None => Err(BuilderError::ValueWithoutKey),
            },
        }
    }
}
