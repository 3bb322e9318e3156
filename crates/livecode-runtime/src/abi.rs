//! Host half of the entry-point ABI.
//!
//! A generated unit exports one C symbol, [`REGISTER_SYMBOL`]. The loader
//! calls it with a [`Registrar`]; the unit calls back `register` once per
//! entry point it offers, in declaration order. Each [`EntryPoint`] is a
//! table of C functions that create, run and destroy one instance.
//! Running an instance receives a [`HostApi`] whose callbacks append to the
//! console log and report faults.
//!
//! These layouts are mirrored by the `host` module of the snippet template
//! and must change together with it (bump [`ABI_VERSION`]).

use std::ffi::c_void;

/// Layout version shared by host and unit.
pub const ABI_VERSION: u32 = 1;

/// Exported registration function of every generated unit.
pub const REGISTER_SYMBOL: &[u8] = b"livecode_register_v1\0";

/// `on_load` / `on_unload` completed.
pub const STATUS_OK: u32 = 0;

/// `on_load` / `on_unload` raised; the message went through `fault`.
pub const STATUS_FAULT: u32 = 1;

/// Callbacks available to a running entry point.
#[repr(C)]
pub struct HostApi {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u32,
    /// Opaque host state passed back to every callback.
    pub ctx: *mut c_void,
    /// Append `(severity code, utf-8 text)` to the console log.
    pub log: extern "C" fn(*mut c_void, u32, *const u8, usize),
    /// Report the message of a caught panic.
    pub fault: extern "C" fn(*mut c_void, *const u8, usize),
}

/// Function table of one registered entry point.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct EntryPoint {
    /// Layout version the unit was generated with.
    pub abi_version: u32,
    /// Type name, utf-8, owned by the unit.
    pub name_ptr: *const u8,
    /// Length of the type name.
    pub name_len: usize,
    /// Construct an instance; null on failure.
    pub create: unsafe extern "C" fn() -> *mut c_void,
    /// Run `on_load`.
    pub on_load: unsafe extern "C" fn(*mut c_void, *const HostApi) -> u32,
    /// Run `on_unload`.
    pub on_unload: unsafe extern "C" fn(*mut c_void, *const HostApi) -> u32,
    /// Drop an instance.
    pub destroy: unsafe extern "C" fn(*mut c_void),
}

/// Collector handed to [`RegisterFn`].
#[repr(C)]
pub struct Registrar {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u32,
    /// Opaque host state passed back to `register`.
    pub ctx: *mut c_void,
    /// Record one entry point. The table is copied before returning.
    pub register: extern "C" fn(*mut c_void, *const EntryPoint),
}

/// Signature of [`REGISTER_SYMBOL`].
pub type RegisterFn = unsafe extern "C" fn(*const Registrar);

/// Signature shared by `on_load` and `on_unload`.
pub type HookFn = unsafe extern "C" fn(*mut c_void, *const HostApi) -> u32;
