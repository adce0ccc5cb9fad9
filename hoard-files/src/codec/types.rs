use std::fmt::{Display, Formatter};

/// The type tag of a chunk, used to dispatch it to a loader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Gid(pub u32);

impl Gid {
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Display for Gid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

impl From<u32> for Gid {
    fn from(value: u32) -> Self {
        Gid(value)
    }
}

/// The persisted 8 byte identity of a node. Zero means "no identity".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid(pub u64);

impl Guid {
    pub const EMPTY: Guid = Guid(0);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Guid(u64::from_le_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl std::str::FromStr for Guid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("0x");
        u64::from_str_radix(s, 16).map(Guid)
    }
}

/// Booleans are stored as 32 bit integers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Bool32(pub bool);

impl From<Bool32> for bool {
    fn from(value: Bool32) -> Self {
        value.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub gid: Gid,
    pub size: u32,
}

impl ChunkHeader {
    /// Tag and size, both u32.
    pub const SIZE: u64 = 8;
}

pub const SIGNATURE: &[u8; 6] = b"GORGON";

/// The highest container version this implementation understands.
pub const CURRENT_VERSION: u32 = 0x0001_0000;

pub mod gid {
    use super::Gid;

    pub const NONE: Gid = Gid(0x0000_0000);

    // System
    pub const FOLDER: Gid = Gid(0x0101_0000);
    /// Legacy list of child names
    pub const FOLDER_NAMES: Gid = Gid(0x0101_0101);
    pub const FOLDER_PROPS: Gid = Gid(0x0101_0103);

    pub const LINK_NODE: Gid = Gid(0x0102_0000);
    pub const LINK_NODE_TARGET: Gid = Gid(0x0102_0010);

    // Special
    /// Legacy 16 byte identity
    pub const GUID: Gid = Gid(0x0000_0010);
    pub const SGUID: Gid = Gid(0x0000_0011);
    pub const NAME: Gid = Gid(0x0000_0012);

    pub const LZMA: Gid = Gid(0xF003_0100);
    pub const JPEG: Gid = Gid(0xF003_0300);
    pub const PNG: Gid = Gid(0xF003_0400);

    // Basic resources
    pub const IMAGE: Gid = Gid(0x0202_0000);
    pub const IMAGE_PROPS: Gid = Gid(0x0202_0101);
    pub const IMAGE_CMP_PROPS: Gid = Gid(0x0202_0102);
    pub const IMAGE_DATA: Gid = Gid(0x0202_0501);
    pub const IMAGE_CMP_DATA: Gid = Gid(0x0202_0601);

    pub const DATA: Gid = Gid(0x0203_0000);
    pub const DATA_TEXT: Gid = Gid(0x0203_0C01);
    pub const DATA_INT: Gid = Gid(0x0203_0C02);
    pub const DATA_FLOAT: Gid = Gid(0x0203_0C03);
    pub const DATA_POINT: Gid = Gid(0x0203_0C04);
    pub const DATA_RECTANGLE: Gid = Gid(0x0203_0C05);
    pub const DATA_POINTF: Gid = Gid(0x0203_0C09);
    pub const DATA_SIZE: Gid = Gid(0x0203_0D03);
    pub const DATA_BOUNDS: Gid = Gid(0x0203_0D04);
    pub const DATA_MARGINS: Gid = Gid(0x0203_0D05);
    pub const DATA_OBJECT: Gid = Gid(0x0203_0D06);

    // Gaming resources
    pub const ANIMATION: Gid = Gid(0x0310_0000);
    pub const ANIMATION_IMAGE: Gid = Gid(0x0311_0000);
    pub const ANIMATION_DURATIONS: Gid = Gid(0x0310_0101);

    // Extended resources
    pub const BLOB: Gid = Gid(0x0402_0000);
    pub const BLOB_PROPS: Gid = Gid(0x0402_0101);
    pub const BLOB_DATA: Gid = Gid(0x0402_0801);
    pub const BLOB_CMP_DATA: Gid = Gid(0x0402_0802);
}
