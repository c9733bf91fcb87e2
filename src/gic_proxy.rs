/*
 * SPDX-License-Identifier: MIT OR BlueOak-1.0.0
 */

//! GIC proxy wake-source state machine.
//!
//! The proxy groups wake-capable interrupt lines into banks of 32. Each
//! group has its own status/mask/enable/disable registers, and a top-level
//! gating register decides which groups may raise a wake signal at all.
//! The driver records requested wake lines per group and copies that
//! bookkeeping into hardware on [`GicProxy::arm`] / [`GicProxy::disarm`].

use {
    crate::{mmio::MMIODerefWrapper, pmc::Pmc, wake_source::WakeSource},
    bitflags::bitflags,
    log::trace,
    snafu::{ensure, Snafu},
    static_assertions::const_assert,
    tock_registers::{
        interfaces::{Readable, Writeable},
        register_structs,
        registers::{ReadOnly, ReadWrite, WriteOnly},
    },
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// GIC proxy registers inside the PMC_GLOBAL module.
//
// One block per group at GIC_PROXY_BASE_OFFSET, GIC_PROXY_GROUP_STRIDE
// apart; a single GICP_PMC_IRQ block gates whole groups, one bit per group.
register_structs! {
    #[allow(non_snake_case)]
    GroupRegisterBlock {
        // Latched interrupt status, one bit per line. Write 1 to clear.
        (0x00 => IRQ_STATUS: ReadWrite<u32>),
        // Line-level mask state; a set bit means the line is disabled.
        // Reads as all-ones once every line in the group is off.
        (0x04 => IRQ_MASK: ReadOnly<u32>),
        // Write 1 to enable a line / to disable it again.
        (0x08 => IRQ_ENABLE: WriteOnly<u32>),
        (0x0c => IRQ_DISABLE: WriteOnly<u32>),
        // Software interrupt trigger. Not used by this driver.
        (0x10 => IRQ_TRIGGER: WriteOnly<u32>),
        (0x14 => @END),
    }
}

register_structs! {
    #[allow(non_snake_case)]
    GatingRegisterBlock {
        // Same layout as a group block minus the trigger register, but
        // with one bit per *group*: writing 1 to IRQ_ENABLE lets a group
        // signal wake events, 1 to IRQ_DISABLE gates it off.
        (0x00 => IRQ_STATUS: ReadWrite<u32>),
        (0x04 => IRQ_MASK: ReadOnly<u32>),
        (0x08 => IRQ_ENABLE: WriteOnly<u32>),
        (0x0c => IRQ_DISABLE: WriteOnly<u32>),
        (0x10 => @END),
    }
}

// Hide the register blocks from the public api.
type GroupRegisters = MMIODerefWrapper<GroupRegisterBlock>;
type GatingRegisters = MMIODerefWrapper<GatingRegisterBlock>;

/// Group register blocks, relative to the PMC_GLOBAL base.
const GIC_PROXY_BASE_OFFSET: usize = 0x3_0000;
const GIC_PROXY_GROUP_STRIDE: usize = 0x14;

/// GICP_PMC_IRQ group-gating block, relative to the PMC_GLOBAL base.
const GICP_PMC_IRQ_OFFSET: usize = 0x3_0a00;

/// IRQ_MASK readback value once every line in a group is disabled.
const GIC_PROXY_ALL_MASK: u32 = 0xffff_ffff;

bitflags! {
    struct ProxyFlags: u32 {
        const ENABLED = 0b0000_0001;
    }
}

#[derive(Copy, Clone)]
struct GroupState {
    /// Lines in this group currently requested as wake sources. Source of
    /// truth for what arm() programs; hardware may lag behind it.
    pending_mask: u32,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// The proxy organizes wake lines in 5 groups of 32.
pub const GIC_PROXY_GROUP_COUNT: usize = 5;

// The gating registers carry one bit per group.
const_assert!(GIC_PROXY_GROUP_COUNT <= 32);

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum Error {
    #[snafu(display("wake source group {} out of range", group))]
    GroupOutOfRange { group: u32 },
}

pub type Result<T> = core::result::Result<T, Error>;

/// Driver for the PMC GIC proxy.
///
/// Owns the per-group wake bookkeeping; all register traffic goes to the
/// PMC_GLOBAL block of the [`Pmc`] it was constructed with. Mutating
/// operations take `&mut self` — callers in concurrent contexts must wrap
/// the driver in their own mutual exclusion.
pub struct GicProxy {
    base_addr: usize,
    groups: [GroupState; GIC_PROXY_GROUP_COUNT],
    flags: ProxyFlags,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl GicProxy {
    /// Create a driver for the proxy inside `pmc`, with no wake sources
    /// registered and the proxy disarmed.
    ///
    /// # Safety
    ///
    /// The PMC descriptor must carry the real PMC_GLOBAL base address;
    /// nothing here can check it.
    pub const unsafe fn new(pmc: Pmc) -> Self {
        Self {
            base_addr: pmc.global_base_addr(),
            groups: [GroupState { pending_mask: 0 }; GIC_PROXY_GROUP_COUNT],
            flags: ProxyFlags::empty(),
        }
    }

    /// Request (or withdraw) `source` as a wake source.
    ///
    /// Only edits the pending mask — hardware enables change on the next
    /// [`Self::arm`]. When enabling, the line's latched status is cleared
    /// right away so that a stale event latched while the system was
    /// running cannot fire the moment the proxy is armed.
    ///
    /// Idempotent in both directions. Fails only on an out-of-range group
    /// index.
    pub fn set_wake_source(&mut self, source: &WakeSource, enable: bool) -> Result<()> {
        let group = source.group as usize;
        ensure!(
            group < GIC_PROXY_GROUP_COUNT,
            GroupOutOfRangeSnafu {
                group: source.group
            }
        );

        if enable {
            self.group_registers(group).IRQ_STATUS.set(source.line_mask);
            self.groups[group].pending_mask |= source.line_mask;
        } else {
            self.groups[group].pending_mask &= !source.line_mask;
        }

        trace!(
            "gic proxy wake source group {} mask {:#x} {}",
            source.group,
            source.line_mask,
            if enable { "set" } else { "cleared" }
        );

        Ok(())
    }

    /// Program the pending masks into hardware and mark the proxy armed.
    ///
    /// Every group's enable register receives its full pending mask, so
    /// lines outside the mask stay disabled. Groups with a non-zero mask
    /// additionally get their gating bit set; empty groups are left gated
    /// off so they cannot contribute a spurious wake.
    pub fn arm(&mut self) {
        for (index, group) in self.groups.iter().enumerate() {
            self.group_registers(index)
                .IRQ_ENABLE
                .set(group.pending_mask);

            if group.pending_mask != 0 {
                self.gating_registers().IRQ_ENABLE.set(1 << index);
            }
        }

        self.flags.insert(ProxyFlags::ENABLED);
        trace!("gic proxy armed");
    }

    /// Stop every registered line from signalling wake and mark the proxy
    /// disarmed. The pending masks are left intact; use [`Self::reset`] to
    /// drop them as well.
    pub fn disarm(&mut self) {
        for (index, group) in self.groups.iter().enumerate() {
            let registers = self.group_registers(index);

            // Ack before disabling, or a latched line would re-fire the
            // next time the group is armed.
            registers.IRQ_STATUS.set(group.pending_mask);
            registers.IRQ_DISABLE.set(group.pending_mask);

            // Other software may keep lines in this group unmasked behind
            // our back; only gate the group off once hardware reports
            // every line disabled.
            if registers.IRQ_MASK.get() == GIC_PROXY_ALL_MASK {
                self.gating_registers().IRQ_DISABLE.set(1 << index);
            }
        }

        self.flags.remove(ProxyFlags::ENABLED);
        trace!("gic proxy disarmed");
    }

    /// Return the proxy to its post-init baseline: disarm if armed, then
    /// drop every registered wake source.
    ///
    /// Resume paths call this so that no registration survives into a
    /// later suspend attempt.
    pub fn reset(&mut self) {
        if self.flags.contains(ProxyFlags::ENABLED) {
            self.disarm();
        }

        for group in self.groups.iter_mut() {
            group.pending_mask = 0;
        }

        trace!("gic proxy cleared");
    }

    /// True iff the hardware enables currently reflect the pending masks.
    pub fn is_armed(&self) -> bool {
        self.flags.contains(ProxyFlags::ENABLED)
    }

    /// Pending wake mask of one group, `None` for an out-of-range index.
    pub fn pending_mask(&self, group: u32) -> Option<u32> {
        self.groups.get(group as usize).map(|g| g.pending_mask)
    }

    fn group_registers(&self, group: usize) -> GroupRegisters {
        unsafe {
            GroupRegisters::new(
                self.base_addr + GIC_PROXY_BASE_OFFSET + group * GIC_PROXY_GROUP_STRIDE,
            )
        }
    }

    fn gating_registers(&self) -> GatingRegisters {
        unsafe { GatingRegisters::new(self.base_addr + GICP_PMC_IRQ_OFFSET) }
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const IRQ_STATUS: usize = 0x0;
    const IRQ_MASK: usize = 0x4;
    const IRQ_ENABLE: usize = 0x8;
    const IRQ_DISABLE: usize = 0xc;

    /// Words of fake register memory covering everything up to the end of
    /// the gating block.
    const REG_WORDS: usize = (GICP_PMC_IRQ_OFFSET + 0x10) / 4;

    fn group_reg(group: usize, offset: usize) -> usize {
        (GIC_PROXY_BASE_OFFSET + group * GIC_PROXY_GROUP_STRIDE + offset) / 4
    }

    fn gating_reg(offset: usize) -> usize {
        (GICP_PMC_IRQ_OFFSET + offset) / 4
    }

    fn fake_proxy() -> (Vec<u32>, GicProxy) {
        let mut reg = vec![0u32; REG_WORDS];
        let proxy = unsafe { GicProxy::new(Pmc::new(reg.as_mut_ptr() as usize)) };

        (reg, proxy)
    }

    #[test]
    fn test_register_wake_source() {
        let (reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(2, 0x4), true)
            .unwrap();

        assert_eq!(proxy.pending_mask(2), Some(0x4));
        // Stale latched status for the line is cleared on registration.
        assert_eq!(reg[group_reg(2, IRQ_STATUS)], 0x4);
        // No other group touched, nothing enabled yet.
        for group in [0, 1, 3, 4] {
            assert_eq!(proxy.pending_mask(group), Some(0));
            assert_eq!(reg[group_reg(group as usize, IRQ_STATUS)], 0);
        }
        assert_eq!(reg[group_reg(2, IRQ_ENABLE)], 0);
        assert!(!proxy.is_armed());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let (_reg, mut proxy) = fake_proxy();
        let uart = WakeSource::new(1, 0x2);
        let gpio = WakeSource::new(1, 0x10);

        proxy.set_wake_source(&uart, true).unwrap();
        proxy.set_wake_source(&uart, true).unwrap();
        proxy.set_wake_source(&gpio, true).unwrap();
        assert_eq!(proxy.pending_mask(1), Some(0x12));

        proxy.set_wake_source(&uart, false).unwrap();
        assert_eq!(proxy.pending_mask(1), Some(0x10));
        proxy.set_wake_source(&uart, false).unwrap();
        assert_eq!(proxy.pending_mask(1), Some(0x10));
    }

    #[test]
    fn test_rejects_out_of_range_group() {
        let (reg, mut proxy) = fake_proxy();

        let result = proxy.set_wake_source(&WakeSource::new(5, 0x1), true);

        assert_eq!(result, Err(Error::GroupOutOfRange { group: 5 }));
        for group in 0..GIC_PROXY_GROUP_COUNT {
            assert_eq!(proxy.pending_mask(group as u32), Some(0));
            assert_eq!(reg[group_reg(group, IRQ_STATUS)], 0);
        }
    }

    #[test]
    fn test_arm_programs_enables_and_gating() {
        let (mut reg, mut proxy) = fake_proxy();

        // Pre-seed the enable registers so a full-mask write of zero is
        // distinguishable from no write at all.
        for group in 0..GIC_PROXY_GROUP_COUNT {
            reg[group_reg(group, IRQ_ENABLE)] = 0xffff_ffff;
        }

        proxy
            .set_wake_source(&WakeSource::new(2, 0x4), true)
            .unwrap();
        proxy.arm();

        assert_eq!(reg[group_reg(2, IRQ_ENABLE)], 0x4);
        for group in [0, 1, 3, 4] {
            assert_eq!(reg[group_reg(group, IRQ_ENABLE)], 0);
        }
        assert_eq!(reg[gating_reg(IRQ_ENABLE)], 1 << 2);
        assert!(proxy.is_armed());
    }

    #[test]
    fn test_arm_with_no_sources_gates_nothing() {
        let (reg, mut proxy) = fake_proxy();

        proxy.arm();

        assert_eq!(reg[gating_reg(IRQ_ENABLE)], 0);
        assert!(proxy.is_armed());
    }

    #[test]
    fn test_disarm_acks_then_disables() {
        let (mut reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(2, 0x4), true)
            .unwrap();
        proxy.arm();

        // Hardware reports every line in the group disabled again.
        reg[group_reg(2, IRQ_STATUS)] = 0;
        reg[group_reg(2, IRQ_MASK)] = GIC_PROXY_ALL_MASK;

        proxy.disarm();

        assert_eq!(reg[group_reg(2, IRQ_STATUS)], 0x4);
        assert_eq!(reg[group_reg(2, IRQ_DISABLE)], 0x4);
        assert_eq!(reg[gating_reg(IRQ_DISABLE)], 1 << 2);
        assert!(!proxy.is_armed());
        // Disarm never drops the registration itself.
        assert_eq!(proxy.pending_mask(2), Some(0x4));
    }

    #[test]
    fn test_disarm_keeps_group_gated_on_while_lines_unmasked() {
        let (mut reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(1, 0x8), true)
            .unwrap();
        proxy.arm();

        // Some line in the group, not ours, is still unmasked.
        reg[group_reg(1, IRQ_MASK)] = !0x8;

        proxy.disarm();

        assert_eq!(reg[group_reg(1, IRQ_DISABLE)], 0x8);
        assert_eq!(reg[gating_reg(IRQ_DISABLE)], 0);
        assert!(!proxy.is_armed());
    }

    #[test]
    fn test_reset_from_armed_returns_to_baseline() {
        let (mut reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(0, 0x1), true)
            .unwrap();
        proxy
            .set_wake_source(&WakeSource::new(4, 0x8000_0000), true)
            .unwrap();
        proxy.arm();

        for group in 0..GIC_PROXY_GROUP_COUNT {
            reg[group_reg(group, IRQ_MASK)] = GIC_PROXY_ALL_MASK;
        }

        proxy.reset();

        // Disarm ran: registered lines acked and disabled, groups gated off.
        assert_eq!(reg[group_reg(0, IRQ_DISABLE)], 0x1);
        assert_eq!(reg[group_reg(4, IRQ_DISABLE)], 0x8000_0000);
        assert_eq!(reg[gating_reg(IRQ_DISABLE)], 1 << 4);
        // And the bookkeeping matches a freshly constructed driver.
        assert!(!proxy.is_armed());
        for group in 0..GIC_PROXY_GROUP_COUNT {
            assert_eq!(proxy.pending_mask(group as u32), Some(0));
        }
    }

    #[test]
    fn test_reset_when_disarmed_skips_hardware() {
        let (reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(0, 0x1), true)
            .unwrap();
        proxy.reset();

        assert_eq!(proxy.pending_mask(0), Some(0));
        assert_eq!(reg[group_reg(0, IRQ_DISABLE)], 0);
        assert_eq!(reg[gating_reg(IRQ_DISABLE)], 0);
    }

    #[test]
    fn test_rearm_after_reset_arms_nothing() {
        let (mut reg, mut proxy) = fake_proxy();

        proxy
            .set_wake_source(&WakeSource::new(3, 0x40), true)
            .unwrap();
        proxy.arm();
        for group in 0..GIC_PROXY_GROUP_COUNT {
            reg[group_reg(group, IRQ_MASK)] = GIC_PROXY_ALL_MASK;
        }
        proxy.reset();

        // A second suspend attempt must not inherit the old registration.
        reg[gating_reg(IRQ_ENABLE)] = 0;
        proxy.arm();

        assert_eq!(reg[group_reg(3, IRQ_ENABLE)], 0);
        assert_eq!(reg[gating_reg(IRQ_ENABLE)], 0);
        assert!(proxy.is_armed());
    }
}
