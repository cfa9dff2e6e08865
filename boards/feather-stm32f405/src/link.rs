#![deny(unsafe_code)]
//! Host links
//!
//! Default build: SPI2 with DMA towards the host adapter, chip select
//! toggled per burst by the shared-bus `SpiDevice`. With the `uart-link`
//! feature: USART3 TX with DMA, header/footer framed.

use radar_core::TransportConfig;

#[cfg(not(feature = "uart-link"))]
pub use spi::*;
#[cfg(feature = "uart-link")]
pub use uart::*;

#[cfg(not(feature = "uart-link"))]
mod spi {
    use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice as SpiDeviceBus;
    use embassy_stm32::gpio::{Level, Output, Speed};
    use embassy_stm32::mode::Async;
    use embassy_stm32::peripherals;
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use embassy_stm32::Peri;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::mutex::Mutex;
    use radar_core::BlockTransport;
    use static_cell::StaticCell;

    use super::TransportConfig;

    pub struct LinkPeripherals {
        pub spi: Peri<'static, peripherals::SPI2>,
        pub sck: Peri<'static, peripherals::PB13>,
        pub mosi: Peri<'static, peripherals::PB15>,
        pub miso: Peri<'static, peripherals::PB14>,
        pub cs: Peri<'static, peripherals::PC6>,
        pub dma_tx: Peri<'static, peripherals::DMA1_CH4>,
        pub dma_rx: Peri<'static, peripherals::DMA1_CH3>,
    }

    type SpiBus = Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;

    pub type HostLink = BlockTransport<
        SpiDeviceBus<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>,
    >;

    pub fn host_link(periph: LinkPeripherals, config: TransportConfig) -> HostLink {
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(12_000_000);

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );
        let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);

        static SPI_BUS: StaticCell<SpiBus> = StaticCell::new();
        let bus = SPI_BUS.init(Mutex::new(spi));

        defmt::info!(
            "SPI link: {} byte bursts at 12 MHz",
            config.max_burst_bytes
        );
        BlockTransport::new(SpiDeviceBus::new(bus, cs), config)
    }
}

#[cfg(feature = "uart-link")]
mod uart {
    use embassy_stm32::mode::Async;
    use embassy_stm32::peripherals;
    use embassy_stm32::usart::{self, UartTx};
    use embassy_stm32::Peri;
    use radar_core::WordTransport;

    use super::TransportConfig;

    const BAUD_RATE: u32 = 921_600;

    /// Units per frame on the serial plotter: one range profile
    const UNITS_PER_FRAME: usize = 128;

    pub struct LinkPeripherals {
        pub usart: Peri<'static, peripherals::USART3>,
        pub tx: Peri<'static, peripherals::PB10>,
        pub dma_tx: Peri<'static, peripherals::DMA1_CH3>,
    }

    pub type HostLink = WordTransport<UartTx<'static, Async>>;

    pub fn host_link(periph: LinkPeripherals, config: TransportConfig) -> HostLink {
        let mut uart_config = usart::Config::default();
        uart_config.baudrate = BAUD_RATE;

        let tx = match UartTx::new(periph.usart, periph.tx, periph.dma_tx, uart_config) {
            Ok(tx) => tx,
            Err(e) => defmt::panic!("USART3 config rejected: {}", e),
        };

        defmt::info!("UART link: {} baud", BAUD_RATE);
        WordTransport::new(tx, &config).with_units_per_frame(UNITS_PER_FRAME)
    }
}
