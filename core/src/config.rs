#![deny(unsafe_code)]
//! Radar, transport and interrupt configuration
//!
//! The chirp and antenna parameters below are the ones the RF front-end is
//! programmed with. The range-processing dimensions are derived from them
//! rather than configured independently, so the radar cube size the engine
//! writes always matches the size the transport sends and the host expects.

use hal_abstractions::{BufferDescriptor, EngineParams, MimoMode, MAX_RX_CHANNELS};

use crate::error::ConfigError;

/// Bytes per complex 16-bit range-FFT sample (re + im)
pub const SAMPLE_BYTES: usize = 4;

/// Maximum TX antennas on the front-end
pub const MAX_TX_ANTENNAS: u8 = 2;

/// FFT output right shift; ADC samples are 12-bit so there is headroom
const FFT_OUTPUT_DIV_SHIFT: u8 = 2;

/// ADC buffer rows are padded to this many bytes for the DMA engine
const RX_CHANNEL_ALIGN: usize = 16;

/// Chirp and antenna configuration of the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadarConfig {
    pub num_tx_antennas: u8,
    pub num_rx_antennas: u8,
    /// ADC samples per chirp, also the range FFT size
    pub num_adc_samples: u16,
    pub num_bursts_per_frame: u16,
    pub num_chirps_per_burst: u16,
    /// Chirp TX MIMO pattern select as written to the front-end:
    /// 0 or 1 for TDM, 4 for BPM
    pub mimo_select: u8,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            num_tx_antennas: 2,
            num_rx_antennas: 3,
            num_adc_samples: 128,
            num_bursts_per_frame: 1,
            num_chirps_per_burst: 8,
            mimo_select: 4,
        }
    }
}

impl RadarConfig {
    /// Check the configuration and derive the processing dimensions
    pub fn validate(&self) -> Result<CubeLayout, ConfigError> {
        if self.num_tx_antennas == 0
            || self.num_rx_antennas == 0
            || self.num_adc_samples < 2
            || self.num_bursts_per_frame == 0
            || self.num_chirps_per_burst == 0
        {
            return Err(ConfigError::ZeroDimension);
        }
        if self.num_tx_antennas > MAX_TX_ANTENNAS
            || usize::from(self.num_rx_antennas) > MAX_RX_CHANNELS
        {
            return Err(ConfigError::TooManyAntennas);
        }

        let mimo = match self.mimo_select {
            0 | 1 => MimoMode::Tdm,
            4 => MimoMode::Bpm,
            other => return Err(ConfigError::UnsupportedMimo(other)),
        };

        let chirps_per_frame = self
            .num_bursts_per_frame
            .checked_mul(self.num_chirps_per_burst)
            .ok_or(ConfigError::TooManyChirps)?;
        if chirps_per_frame % u16::from(self.num_tx_antennas) != 0 {
            return Err(ConfigError::UnevenDopplerChirps);
        }

        Ok(CubeLayout {
            num_virtual_antennas: self.num_tx_antennas * self.num_rx_antennas,
            // real-valued ADC samples: only half the spectrum is unique
            num_range_bins: self.num_adc_samples / 2,
            num_chirps_per_frame: chirps_per_frame,
            num_doppler_chirps_per_frame: chirps_per_frame / u16::from(self.num_tx_antennas),
            mimo,
        })
    }

    /// Window size in bytes: symmetric window stores half the coefficients
    pub fn window_bytes(&self) -> usize {
        core::mem::size_of::<u32>() * ((usize::from(self.num_adc_samples) + 1) / 2)
    }

    /// Bytes of one RX channel's chirp in the ADC buffer, padded for DMA
    pub fn bytes_per_rx_channel(&self) -> usize {
        let raw = usize::from(self.num_adc_samples) * core::mem::size_of::<u16>();
        raw.div_ceil(RX_CHANNEL_ALIGN) * RX_CHANNEL_ALIGN
    }

    /// Byte offsets of each RX channel in the ADC buffer
    pub fn rx_channel_offsets(&self) -> [u32; MAX_RX_CHANNELS] {
        let stride = self.bytes_per_rx_channel() as u32;
        let mut offsets = [0u32; MAX_RX_CHANNELS];
        for (index, offset) in offsets.iter_mut().enumerate() {
            *offset = index as u32 * stride;
        }
        offsets
    }

    /// Build the engine parameter set for buffers placed at `window` and `cube`
    pub fn engine_params(
        &self,
        layout: &CubeLayout,
        window: BufferDescriptor,
        cube: BufferDescriptor,
    ) -> EngineParams {
        EngineParams {
            num_tx_antennas: self.num_tx_antennas,
            num_rx_antennas: self.num_rx_antennas,
            num_virtual_antennas: layout.num_virtual_antennas,
            range_fft_size: self.num_adc_samples,
            num_range_bins: layout.num_range_bins,
            num_chirps_per_frame: layout.num_chirps_per_frame,
            num_doppler_chirps_per_frame: layout.num_doppler_chirps_per_frame,
            mimo: layout.mimo,
            rx_channel_offsets: self.rx_channel_offsets(),
            fft_output_div_shift: FFT_OUTPUT_DIV_SHIFT,
            window,
            radar_cube: cube,
        }
    }
}

/// Processing dimensions derived from a [`RadarConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CubeLayout {
    pub num_virtual_antennas: u8,
    pub num_range_bins: u16,
    pub num_chirps_per_frame: u16,
    /// One doppler chirp per full set of TX antennas
    pub num_doppler_chirps_per_frame: u16,
    pub mimo: MimoMode,
}

impl CubeLayout {
    /// Radar cube size: range bins × virtual antennas × sample × doppler chirps
    pub fn radar_cube_bytes(&self) -> usize {
        usize::from(self.num_range_bins)
            * usize::from(self.num_virtual_antennas)
            * SAMPLE_BYTES
            * usize::from(self.num_doppler_chirps_per_frame)
    }
}

/// Chunking parameters of the transport links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// Maximum bytes per block transfer burst
    pub max_burst_bytes: usize,
    /// Bytes per transfer element (one SPI frame, one UART unit)
    pub unit_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            // FTDI host adapters read at most 64 KiB per transfer
            max_burst_bytes: 65536,
            unit_bytes: 4,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_bytes == 0
            || self.max_burst_bytes == 0
            || self.max_burst_bytes % self.unit_bytes != 0
        {
            return Err(ConfigError::InvalidBurstSize);
        }
        Ok(())
    }
}

/// Priorities of the timing-event interrupts
///
/// Higher numbers preempt lower ones, matching RTIC's convention. All of them
/// must sit above the task priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqPriorities {
    pub frame_start: u8,
    pub chirp_start: u8,
    pub chirp_available: u8,
}

impl Default for IrqPriorities {
    fn default() -> Self {
        Self {
            frame_start: 3,
            chirp_start: 3,
            chirp_available: 3,
        }
    }
}
