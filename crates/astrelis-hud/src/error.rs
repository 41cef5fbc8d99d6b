//! Error types for the HUD system.

use std::fmt;

/// The fixed-capacity arena that ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// Entity spans in the instance store.
    Entities,
    /// Icon slots in one entity span.
    Icons,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityKind::Entities => write!(f, "entities"),
            CapacityKind::Icons => write!(f, "icon slots"),
        }
    }
}

/// Errors that can occur in the HUD system.
///
/// Fetch failures and stale avatar completions are recovered inside the
/// avatar cache and never reach callers of [`HudSystem`](crate::HudSystem).
#[derive(Debug)]
pub enum HudError {
    /// A fixed-capacity arena is full.
    CapacityExceeded {
        kind: CapacityKind,
        capacity: usize,
    },

    /// The entity index was never handed out by this system.
    UnknownEntity { index: usize },

    /// A required shader could not be found at setup.
    MissingShader { name: String },

    /// Glyph records were not strictly ascending by character code.
    InvalidGlyphTable {
        /// Position of the first out-of-order record.
        position: usize,
        previous: char,
        current: char,
    },

    /// The configuration violates a layout or bit-field constraint.
    InvalidConfig { reason: String },

    /// No suitable GPU adapter was found.
    NoAdapter(wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    DeviceRequest(wgpu::RequestDeviceError),

    /// An avatar image could not be fetched or decoded.
    FetchFailed { avatar_id: u64, reason: String },

    /// An avatar image does not match the slice dimensions.
    ImageSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
        len: usize,
    },

    /// A cache slot index outside the texture array.
    SlotOutOfRange { slot: usize, capacity: usize },
}

impl fmt::Display for HudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HudError::CapacityExceeded { kind, capacity } => {
                write!(f, "HUD capacity exceeded: at most {} {}", capacity, kind)
            }
            HudError::UnknownEntity { index } => write!(f, "Unknown HUD entity: {}", index),
            HudError::MissingShader { name } => write!(f, "Shader not found: {}", name),
            HudError::InvalidGlyphTable {
                position,
                previous,
                current,
            } => write!(
                f,
                "Glyph table not sorted: {:?} at position {} follows {:?}",
                current, position, previous
            ),
            HudError::InvalidConfig { reason } => write!(f, "Invalid HUD config: {}", reason),
            HudError::NoAdapter(err) => write!(f, "No suitable GPU adapter: {}", err),
            HudError::DeviceRequest(err) => write!(f, "Failed to create device: {}", err),
            HudError::FetchFailed { avatar_id, reason } => {
                write!(f, "Failed to fetch avatar {}: {}", avatar_id, reason)
            }
            HudError::ImageSizeMismatch {
                expected,
                actual,
                len,
            } => write!(
                f,
                "Avatar image is {}x{} ({} bytes), expected {}x{} RGBA8",
                actual.0, actual.1, len, expected.0, expected.1
            ),
            HudError::SlotOutOfRange { slot, capacity } => {
                write!(f, "Avatar slot {} out of range (capacity {})", slot, capacity)
            }
        }
    }
}

impl std::error::Error for HudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HudError::NoAdapter(err) => Some(err),
            HudError::DeviceRequest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<wgpu::RequestAdapterError> for HudError {
    fn from(err: wgpu::RequestAdapterError) -> Self {
        HudError::NoAdapter(err)
    }
}

impl From<wgpu::RequestDeviceError> for HudError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        HudError::DeviceRequest(err)
    }
}

/// Result type alias for HUD operations.
pub type HudResult<T> = Result<T, HudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = HudError::CapacityExceeded {
            kind: CapacityKind::Entities,
            capacity: 3,
        };
        assert_eq!(err.to_string(), "HUD capacity exceeded: at most 3 entities");
    }

    #[test]
    fn test_glyph_table_message() {
        let err = HudError::InvalidGlyphTable {
            position: 2,
            previous: 'b',
            current: 'a',
        };
        assert_eq!(
            err.to_string(),
            "Glyph table not sorted: 'a' at position 2 follows 'b'"
        );
    }
}
