/*
 * SPDX-License-Identifier: MIT OR BlueOak-1.0.0
 */

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// A peripheral's designated line in the GIC proxy.
///
/// Supplied by whatever enumerates the platform's peripheral topology; the
/// driver treats it as a trusted description of where that peripheral's
/// interrupt surfaces in the proxy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WakeSource {
    /// Index of the proxy group the line belongs to.
    pub group: u32,
    /// Bit position(s) of the line within the group's 32-bit registers.
    pub line_mask: u32,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl WakeSource {
    pub const fn new(group: u32, line_mask: u32) -> Self {
        Self { group, line_mask }
    }
}
