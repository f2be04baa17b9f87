//! Status and identity registers.

/// Expected 5-byte READ_ID signature for the reference part.
pub const EXPECTED_ID: [u8; 5] = [0xAD, 0xDC, 0x10, 0x95, 0x54];

/// One-byte status register returned after program/erase. Only bit 0 is
/// meaningful: 0 = success, 1 = fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister(pub u8);

impl StatusRegister {
    pub fn is_success(self) -> bool {
        self.0 & 0x01 == 0
    }

    pub fn is_fail(self) -> bool {
        !self.is_success()
    }
}

/// Five-byte chip identity as returned by READ_ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRegister(pub [u8; 5]);

impl IdRegister {
    pub fn matches_expected(self) -> bool {
        self.0 == EXPECTED_ID
    }
}

impl std::fmt::Display for IdRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self
            .0
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{bytes}")
    }
}
