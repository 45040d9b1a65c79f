//! Page header and stub descriptor layout.
//!
//! Both structs live inside the page buffer and are accessed in place via
//! `zerocopy`, so a buffer swap carries the complete node state with it.
//!
//! ## Header Layout (12 bytes)
//!
//! ```text
//! Offset  Size  Field       Description
//! ------  ----  ----------  -----------------------------------------
//! 0       2     rec_end     high-water offset of the record region
//! 2       2     stub_bgn    low-water offset of the stub directory
//! 4       2     level       0 for leaves; u16::MAX poison after clear
//! 6       2     total_data  live bytes incl. stubs
//! 8       4     parent      arena id of the parent, NO_PARENT for root
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::PageId;

pub const HEADER_SIZE: usize = size_of::<PageHeader>();
pub const STUB_SIZE: usize = size_of::<Stub>();

/// Raw parent field value of a page without a parent.
const NO_PARENT: u32 = u32::MAX;

/// Poison level written by `clear`; the caller must set a real level.
pub(crate) const LEVEL_POISON: u16 = u16::MAX;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PageHeader {
    rec_end: u16,
    stub_bgn: u16,
    level: u16,
    total_data: u16,
    parent: u32,
}

impl PageHeader {
    pub fn from_bytes(data: &[u8]) -> &Self {
        Self::ref_from_bytes(&data[..HEADER_SIZE]).expect("page buffer is header-aligned")
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> &mut Self {
        Self::mut_from_bytes(&mut data[..HEADER_SIZE]).expect("page buffer is header-aligned")
    }

    pub fn rec_end(&self) -> u16 {
        self.rec_end
    }

    pub fn set_rec_end(&mut self, off: u16) {
        self.rec_end = off;
    }

    pub fn stub_bgn(&self) -> u16 {
        self.stub_bgn
    }

    pub fn set_stub_bgn(&mut self, off: u16) {
        self.stub_bgn = off;
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn set_level(&mut self, level: u16) {
        self.level = level;
    }

    pub fn total_data(&self) -> u16 {
        self.total_data
    }

    pub fn set_total_data(&mut self, size: u16) {
        self.total_data = size;
    }

    pub fn parent(&self) -> Option<PageId> {
        if self.parent == NO_PARENT {
            None
        } else {
            Some(PageId::new(self.parent))
        }
    }

    pub fn set_parent(&mut self, parent: Option<PageId>) {
        self.parent = match parent {
            Some(id) => id.index(),
            None => NO_PARENT,
        };
    }
}

/// 6-byte record descriptor; the stub directory is the sorted view of the
/// records in a page.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Stub {
    pub off: u16,
    pub key_size: u16,
    pub value_size: u16,
}

impl Stub {
    pub fn new(off: u16, key_size: u16, value_size: u16) -> Self {
        Self {
            off,
            key_size,
            value_size,
        }
    }

    /// Total record bytes this stub accounts for, including itself.
    pub fn data_size(&self) -> usize {
        self.key_size as usize + self.value_size as usize + STUB_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_12_bytes() {
        assert_eq!(HEADER_SIZE, 12);
    }

    #[test]
    fn stub_is_6_bytes() {
        assert_eq!(STUB_SIZE, 6);
    }

    #[test]
    fn header_parent_round_trip() {
        #[repr(C, align(4))]
        struct AlignedBuf([u8; HEADER_SIZE]);

        let mut buf = AlignedBuf([0; HEADER_SIZE]);
        let header = PageHeader::from_bytes_mut(&mut buf.0);
        header.set_parent(None);
        assert_eq!(header.parent(), None);

        header.set_parent(Some(PageId::new(42)));
        assert_eq!(header.parent(), Some(PageId::new(42)));
    }

    #[test]
    fn stub_data_size_includes_stub() {
        let stub = Stub::new(12, 4, 8);
        assert_eq!(stub.data_size(), 4 + 8 + STUB_SIZE);
    }
}
