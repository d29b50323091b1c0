use serde::Serialize;

/// Hardware-object categories, one per sensor class the platform exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OidKind {
    Chassis = 1,
    Thermal = 2,
    Fan = 3,
    Psu = 4,
    Led = 5,
}

/// Opaque hardware-object identifier.
///
/// Packs the object category in the top byte and a platform-local index in
/// the low 24 bits, so a single u32 names any sensor on the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Oid(u32);

impl Oid {
    pub const fn new(kind: OidKind, index: u32) -> Self {
        Oid(((kind as u32) << 24) | (index & 0x00ff_ffff))
    }

    pub const fn fan(index: u32) -> Self {
        Self::new(OidKind::Fan, index)
    }

    pub const fn is_fan(self) -> bool {
        self.0 >> 24 == OidKind::Fan as u32
    }

    /// Platform-local index within the object's category.
    pub const fn index(self) -> u32 {
        self.0 & 0x00ff_ffff
    }
}
