//! Range-processing accelerator binding
//!
//! The accelerator ships as a vendor static library (`librangeproc.a`) with
//! a C interface. Processing is asynchronous: `rangeproc_process` starts a
//! frame and the library calls back `rangeproc_frame_done` from its own
//! completion interrupt.
//!
//! This module is the only FFI boundary in the firmware.

// extern "C" calls and #[no_mangle] callbacks
#![allow(unsafe_code)]

use core::ffi::c_void;
use core::ptr::NonNull;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use hal_abstractions::{
    BufferDescriptor, ComputeEngine, EngineCommand, EngineParams, EngineStatus, MimoMode,
    ProcessReport, MAX_RX_CHANNELS,
};

/// Library returned success but no handle
const STATUS_NULL_HANDLE: i32 = -100;
/// Buffer does not fit the accelerator's 32-bit address space
const STATUS_BAD_BUFFER: i32 = -101;

/// Control command codes
const CMD_TRIGGER_ACQUIRE: u32 = 1;

#[repr(C)]
struct RawInit {
    instance: u8,
}

#[repr(C)]
struct RawBuffer {
    address: u32,
    len: u32,
}

#[repr(C)]
struct RawParams {
    num_tx_antennas: u8,
    num_rx_antennas: u8,
    num_virtual_antennas: u8,
    /// 0 = TDM, 1 = BPM
    mimo: u8,
    range_fft_size: u16,
    num_range_bins: u16,
    num_chirps_per_frame: u16,
    num_doppler_chirps_per_frame: u16,
    rx_channel_offsets: [u32; MAX_RX_CHANNELS],
    fft_output_div_shift: u8,
    _reserved: [u8; 3],
    window: RawBuffer,
    radar_cube: RawBuffer,
}

extern "C" {
    fn rangeproc_init(init: *const RawInit, handle: *mut *mut c_void) -> i32;
    fn rangeproc_config(handle: *mut c_void, params: *const RawParams, window: *mut u8) -> i32;
    fn rangeproc_control(handle: *mut c_void, command: u32) -> i32;
    fn rangeproc_process(handle: *mut c_void, cube: *mut u8, len: u32) -> i32;
}

/// Completion status and cycle count of the frame in progress
static FRAME_DONE: Signal<CriticalSectionRawMutex, (i32, u32)> = Signal::new();

/// Called by the library from its completion interrupt
#[no_mangle]
pub extern "C" fn rangeproc_frame_done(status: i32, cycles: u32) {
    FRAME_DONE.signal((status, cycles));
}

fn check(status: i32) -> Result<(), EngineStatus> {
    if status == 0 {
        Ok(())
    } else {
        Err(EngineStatus(status))
    }
}

fn raw_buffer(buffer: &BufferDescriptor) -> Result<RawBuffer, EngineStatus> {
    Ok(RawBuffer {
        address: u32::try_from(buffer.address).map_err(|_| EngineStatus(STATUS_BAD_BUFFER))?,
        len: u32::try_from(buffer.len).map_err(|_| EngineStatus(STATUS_BAD_BUFFER))?,
    })
}

impl RawParams {
    fn new(params: &EngineParams) -> Result<Self, EngineStatus> {
        Ok(Self {
            num_tx_antennas: params.num_tx_antennas,
            num_rx_antennas: params.num_rx_antennas,
            num_virtual_antennas: params.num_virtual_antennas,
            mimo: match params.mimo {
                MimoMode::Tdm => 0,
                MimoMode::Bpm => 1,
            },
            range_fft_size: params.range_fft_size,
            num_range_bins: params.num_range_bins,
            num_chirps_per_frame: params.num_chirps_per_frame,
            num_doppler_chirps_per_frame: params.num_doppler_chirps_per_frame,
            rx_channel_offsets: params.rx_channel_offsets,
            fft_output_div_shift: params.fft_output_div_shift,
            _reserved: [0; 3],
            window: raw_buffer(&params.window)?,
            radar_cube: raw_buffer(&params.radar_cube)?,
        })
    }
}

#[derive(Default)]
pub struct RangeProcInit {
    /// Accelerator instance number
    pub instance: u8,
}

pub struct RangeProc {
    handle: NonNull<c_void>,
}

impl ComputeEngine for RangeProc {
    type InitParams = RangeProcInit;

    fn init(params: RangeProcInit) -> Result<Self, EngineStatus> {
        let raw = RawInit {
            instance: params.instance,
        };
        let mut handle = core::ptr::null_mut();
        // SAFETY: both pointers are valid for the duration of the call
        check(unsafe { rangeproc_init(&raw, &mut handle) })?;
        NonNull::new(handle)
            .map(|handle| Self { handle })
            .ok_or(EngineStatus(STATUS_NULL_HANDLE))
    }

    fn configure(&mut self, params: &EngineParams, window: &mut [u8]) -> Result<(), EngineStatus> {
        let raw = RawParams::new(params)?;
        // SAFETY: handle came from rangeproc_init; window is the buffer
        // described by params.window and outlives the call
        check(unsafe { rangeproc_config(self.handle.as_ptr(), &raw, window.as_mut_ptr()) })
    }

    fn control(&mut self, command: EngineCommand) -> Result<(), EngineStatus> {
        let code = match command {
            EngineCommand::TriggerAcquire => CMD_TRIGGER_ACQUIRE,
        };
        // SAFETY: handle came from rangeproc_init
        check(unsafe { rangeproc_control(self.handle.as_ptr(), code) })
    }

    async fn process(&mut self, cube: &mut [u8]) -> Result<ProcessReport, EngineStatus> {
        let len = u32::try_from(cube.len()).map_err(|_| EngineStatus(STATUS_BAD_BUFFER))?;
        FRAME_DONE.reset();
        // SAFETY: cube stays mutably borrowed until the completion callback
        // fires below. The pipeline never drops this future half way.
        check(unsafe { rangeproc_process(self.handle.as_ptr(), cube.as_mut_ptr(), len) })?;
        let (status, cycles) = FRAME_DONE.wait().await;
        check(status)?;
        Ok(ProcessReport { cycles })
    }
}
