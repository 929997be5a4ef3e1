//! Primitive JDWP value types shared by the command descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

/// Largest identifier width the codec can represent (a `u64`).
pub const MAX_ID_SIZE: u8 = 8;

/// The five identifier families whose width the VM chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Field,
    Method,
    Object,
    ReferenceType,
    Frame,
}

impl IdKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdKind::Field => "field",
            IdKind::Method => "method",
            IdKind::Object => "object",
            IdKind::ReferenceType => "reference type",
            IdKind::Frame => "frame",
        }
    }
}

/// Byte widths of the variable-size identifiers in command payloads.
///
/// A VM reports its widths through the `VirtualMachine.IDSizes` command.
/// Until that reply has been seen every width is 8, which matches all
/// mainstream 64-bit VMs.
///
/// | Field               | Default |
/// |---------------------|---------|
/// | `field_id`          | 8       |
/// | `method_id`         | 8       |
/// | `object_id`         | 8       |
/// | `reference_type_id` | 8       |
/// | `frame_id`          | 8       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdSizes {
    pub field_id: u8,
    pub method_id: u8,
    pub object_id: u8,
    pub reference_type_id: u8,
    pub frame_id: u8,
}

impl Default for IdSizes {
    fn default() -> Self {
        Self {
            field_id: MAX_ID_SIZE,
            method_id: MAX_ID_SIZE,
            object_id: MAX_ID_SIZE,
            reference_type_id: MAX_ID_SIZE,
            frame_id: MAX_ID_SIZE,
        }
    }
}

impl IdSizes {
    /// Width in bytes used for identifiers of `kind`.
    pub fn width(&self, kind: IdKind) -> u8 {
        match kind {
            IdKind::Field => self.field_id,
            IdKind::Method => self.method_id,
            IdKind::Object => self.object_id,
            IdKind::ReferenceType => self.reference_type_id,
            IdKind::Frame => self.frame_id,
        }
    }

    /// Checks that every width lies in `1..=8`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidIdSize`] for the first offending width.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        for kind in [
            IdKind::Field,
            IdKind::Method,
            IdKind::Object,
            IdKind::ReferenceType,
            IdKind::Frame,
        ] {
            check_width(kind, i64::from(self.width(kind)))?;
        }
        Ok(())
    }

    /// Builds a width table from the signed values a VM reports, rejecting
    /// anything the codec cannot represent.
    pub fn from_reported(
        field_id: i32,
        method_id: i32,
        object_id: i32,
        reference_type_id: i32,
        frame_id: i32,
    ) -> Result<Self, ProtocolError> {
        let narrow = |kind: IdKind, size: i32| -> Result<u8, ProtocolError> {
            check_width(kind, i64::from(size))?;
            // check_width bounds the value to 1..=8
            Ok(size as u8)
        };
        Ok(Self {
            field_id: narrow(IdKind::Field, field_id)?,
            method_id: narrow(IdKind::Method, method_id)?,
            object_id: narrow(IdKind::Object, object_id)?,
            reference_type_id: narrow(IdKind::ReferenceType, reference_type_id)?,
            frame_id: narrow(IdKind::Frame, frame_id)?,
        })
    }
}

pub(crate) fn check_width(kind: IdKind, size: i64) -> Result<(), ProtocolError> {
    if (1..=i64::from(MAX_ID_SIZE)).contains(&size) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidIdSize {
            kind: kind.as_str(),
            size,
        })
    }
}

// ── Identifiers ───────────────────────────────────────────────────────────────

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:X}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// A VM object reference, encoded with the `object_id` width.
    ObjectId
);
id_type!(
    /// A thread reference, encoded with the `object_id` width.
    ThreadId
);
id_type!(
    /// A thread group reference, encoded with the `object_id` width.
    ThreadGroupId
);
id_type!(
    /// A loaded type, encoded with the `reference_type_id` width.
    ReferenceTypeId
);

// ── Type tag ──────────────────────────────────────────────────────────────────

/// Kind of a reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    Class = 1,
    Interface = 2,
    Array = 3,
}

impl TryFrom<u8> for TypeTag {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TypeTag::Class),
            2 => Ok(TypeTag::Interface),
            3 => Ok(TypeTag::Array),
            other => Err(ProtocolError::MalformedPayload(format!(
                "unknown type tag {other}"
            ))),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeTag::Class => "class",
            TypeTag::Interface => "interface",
            TypeTag::Array => "array",
        })
    }
}

// ── Class status ──────────────────────────────────────────────────────────────

/// Bit set describing how far a class has progressed through loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassStatus(pub i32);

impl ClassStatus {
    pub const VERIFIED: ClassStatus = ClassStatus(1);
    pub const PREPARED: ClassStatus = ClassStatus(2);
    pub const INITIALIZED: ClassStatus = ClassStatus(4);
    pub const ERROR: ClassStatus = ClassStatus(8);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: ClassStatus) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (ClassStatus::VERIFIED, "VERIFIED"),
            (ClassStatus::PREPARED, "PREPARED"),
            (ClassStatus::INITIALIZED, "INITIALIZED"),
            (ClassStatus::ERROR, "ERROR"),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| *name)
        .collect();
        if names.is_empty() {
            write!(f, "0x{:X}", self.0)
        } else {
            f.write_str(&names.join("|"))
        }
    }
}
