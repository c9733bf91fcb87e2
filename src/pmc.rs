/*
 * SPDX-License-Identifier: MIT OR BlueOak-1.0.0
 */

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// PMC_GLOBAL base address on Versal silicon.
pub const PMC_GLOBAL_BASE: usize = 0xF111_0000;

/// Descriptor for the platform management controller.
///
/// The only capability the proxy driver needs from the PMC is the base
/// address of its PMC_GLOBAL register module, so that is all this type
/// exposes. Platform code that discovers the PMC some other way (device
/// topology, firmware handoff) constructs one of these and hands it to
/// [`crate::GicProxy`].
#[derive(Copy, Clone, Debug)]
pub struct Pmc {
    global_base_addr: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl Pmc {
    /// Describe a PMC whose PMC_GLOBAL module lives at `global_base_addr`.
    pub const fn new(global_base_addr: usize) -> Self {
        Self { global_base_addr }
    }

    /// Base address of the PMC_GLOBAL register module.
    pub const fn global_base_addr(&self) -> usize {
        self.global_base_addr
    }
}

impl Default for Pmc {
    fn default() -> Self {
        Self::new(PMC_GLOBAL_BASE)
    }
}
