#![deny(unsafe_code)]
//! Range-processing compute engine contract
//!
//! The accelerator that turns ADC samples into a radar cube is a black box to
//! the pipeline. It is driven through four calls mirroring the vendor DPU
//! interface: `init`, `configure`, `control` and `process`. Every failure is
//! reported as a raw [`EngineStatus`] code; the pipeline treats all of them as
//! unrecoverable.

use core::fmt;
use core::future::Future;

/// Maximum number of physical RX channels the front-end exposes
pub const MAX_RX_CHANNELS: usize = 3;

/// Raw status code returned by the engine on failure
///
/// Zero is success and never wrapped in this type; any other value
/// (typically negative) is carried through unchanged for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStatus(pub i32);

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine status {}", self.0)
    }
}

impl core::error::Error for EngineStatus {}

/// Commands accepted by [`ComputeEngine::control`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineCommand {
    /// Arm the accelerator for the next frame
    TriggerAcquire,
}

/// MIMO transmit scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MimoMode {
    /// Time-division multiplexing, one TX per chirp
    Tdm,
    /// Binary phase modulation, all TX active with phase coding
    Bpm,
}

/// Location of a buffer the engine reads from or writes to
///
/// Hardware accelerators are programmed with bus addresses, so buffers are
/// described by address and length rather than by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferDescriptor {
    /// Bus address of the first byte
    pub address: usize,
    /// Length in bytes
    pub len: usize,
}

impl BufferDescriptor {
    /// Describe an in-memory byte slice
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            address: bytes.as_ptr() as usize,
            len: bytes.len(),
        }
    }
}

/// Full static parameter set pushed to the engine once per configuration epoch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineParams {
    pub num_tx_antennas: u8,
    pub num_rx_antennas: u8,
    pub num_virtual_antennas: u8,
    /// Range FFT length, equal to the ADC samples per chirp
    pub range_fft_size: u16,
    pub num_range_bins: u16,
    pub num_chirps_per_frame: u16,
    pub num_doppler_chirps_per_frame: u16,
    pub mimo: MimoMode,
    /// Per RX channel byte offsets into the ADC buffer
    pub rx_channel_offsets: [u32; MAX_RX_CHANNELS],
    /// Right shift applied to the FFT output
    pub fft_output_div_shift: u8,
    /// Window coefficients, filled in by `configure`
    pub window: BufferDescriptor,
    /// Output radar cube
    pub radar_cube: BufferDescriptor,
}

/// Diagnostics returned for a completed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessReport {
    /// Accelerator cycles spent on the frame, if the engine measures them
    pub cycles: u32,
}

/// Range-processing accelerator
///
/// Implementations own whatever hardware handle the vendor library hands
/// out. The radar cube itself is lent to the engine for the duration of
/// [`process`](Self::process) only; between frames it belongs to whoever
/// holds the pipeline's cube handle.
pub trait ComputeEngine {
    /// Parameters needed to open the accelerator
    type InitParams;

    /// Open the engine; a failure here is fatal to the firmware
    fn init(params: Self::InitParams) -> Result<Self, EngineStatus>
    where
        Self: Sized;

    /// Push the static parameter set and fill in the window coefficients
    ///
    /// `window` is the working buffer described by `params.window`. After this
    /// call returns it is treated as read-only.
    fn configure(&mut self, params: &EngineParams, window: &mut [u8]) -> Result<(), EngineStatus>;

    /// Issue a control command
    fn control(&mut self, command: EngineCommand) -> Result<(), EngineStatus>;

    /// Wait until one full radar cube has been written into `cube`
    fn process(
        &mut self,
        cube: &mut [u8],
    ) -> impl Future<Output = Result<ProcessReport, EngineStatus>>;
}
