/*
 * SPDX-License-Identifier: MIT OR BlueOak-1.0.0
 */

//! Wake-source driver for the GIC proxy block in the Versal PMC.
//!
//! While the APU cluster and its GIC are powered down, the PMC's GIC proxy
//! can forward a selected set of peripheral interrupts as wake events.
//! This crate keeps the per-group bookkeeping of which lines are requested
//! as wake sources and programs the proxy registers on the way into and
//! out of a low-power state:
//!
//! * [`GicProxy::set_wake_source`] records (or withdraws) one peripheral's
//!   wake request while the system is still running,
//! * [`GicProxy::arm`] programs the recorded masks into hardware right
//!   before suspend,
//! * [`GicProxy::disarm`] acknowledges and disables them on resume,
//! * [`GicProxy::reset`] returns the proxy to its post-init baseline so no
//!   stale registration leaks into the next suspend cycle.
//!
//! The driver is single-actor by contract: every mutating operation takes
//! `&mut self`, and there is no interior locking. Callers running under
//! multiple execution contexts must serialize access themselves.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::upper_case_acronyms)]

mod gic_proxy;
mod mmio;
mod pmc;
mod wake_source;

pub use {
    gic_proxy::{Error, GicProxy, Result, GIC_PROXY_GROUP_COUNT},
    pmc::{Pmc, PMC_GLOBAL_BASE},
    wake_source::WakeSource,
};
