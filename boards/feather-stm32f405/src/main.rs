#![deny(unsafe_code)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use radar_core::{InterruptHub, SharedContext};

mod engine;
mod exti;
mod link;
mod memory;

stm32_tim2_monotonic!(Mono, 1_000_000);

/// State shared by the processing task, the transport task and the EXTI
/// handlers
static CONTEXT: SharedContext<'static, CriticalSectionRawMutex> = SharedContext::new();

static EXTI_LINES: exti::ExtiLines = exti::ExtiLines;

static HUB: InterruptHub<'static, exti::ExtiLines, CriticalSectionRawMutex> =
    InterruptHub::new(&EXTI_LINES, &CONTEXT.counters);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, UART4, UART5])]
mod app {
    use super::*;
    use defmt::{info, warn};
    use embassy_stm32::gpio::{Input, Pull};
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::time::Hertz;
    use hal_abstractions::TimingEvent;
    use radar_core::{
        open_engine, FrameProcessor, IrqPriorities, RadarConfig, TransportChannel,
        TransportConfig,
    };

    use engine::{RangeProc, RangeProcInit};
    use link::{host_link, LinkPeripherals};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        /// Front-end timing outputs; held so the pins stay inputs
        timing_pins: [Input<'static>; 3],
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        info!("Radar node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(2) = 168 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV2),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 168 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV4; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("System initialized: SYSCLK=168MHz");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        Mono::start(84_000_000);

        // EXTI timestamps come from the cycle counter
        cx.core.DCB.enable_trace();
        cx.core.DWT.enable_cycle_counter();

        let timing_pins = [
            Input::new(p.PA0, Pull::Down),
            Input::new(p.PA1, Pull::Down),
            Input::new(p.PA2, Pull::Down),
        ];
        exti::ExtiLines::configure();

        let large = memory::take_large_pool();
        let local = memory::take_local_pool();
        let (Some(large), Some(local)) = (large, local) else {
            defmt::panic!("pool regions already taken");
        };
        info!(
            "Pools: large {} bytes @ {:#x}, local {} bytes @ {:#x}",
            large.len(),
            large.as_ptr() as usize,
            local.len(),
            local.as_ptr() as usize
        );

        #[cfg(not(feature = "uart-link"))]
        let link_periph = LinkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };
        #[cfg(feature = "uart-link")]
        let link_periph = LinkPeripherals {
            usart: p.USART3,
            tx: p.PB10,
            dma_tx: p.DMA1_CH3,
        };

        processing::spawn(large, local).ok();
        supervisor::spawn(link_periph).ok();

        (
            Shared {},
            Local { timing_pins },
        )
    }

    /// Frame processing: configure once, then compute and hand off forever
    #[task(priority = 2)]
    async fn processing(
        _cx: processing::Context,
        large: &'static mut [u8],
        local: &'static mut [u8],
    ) -> ! {
        info!("Processing task started");

        let engine = match open_engine::<RangeProc>(RangeProcInit::default()) {
            Ok(engine) => engine,
            Err(e) => defmt::panic!("{}", e),
        };

        let processor = FrameProcessor::new(
            engine,
            RadarConfig::default(),
            IrqPriorities {
                frame_start: exti::TIMING_IRQ_PRIORITY,
                chirp_start: exti::TIMING_IRQ_PRIORITY,
                chirp_available: exti::TIMING_IRQ_PRIORITY,
            },
            large,
            local,
            &CONTEXT,
        );

        let e = processor.run(&HUB).await;
        defmt::panic!("processing halted: {}", e);
    }

    /// Waits for configuration, brings up the host link, then reports
    /// timing diagnostics
    #[task(priority = 1)]
    async fn supervisor(_cx: supervisor::Context, link_periph: LinkPeripherals) -> ! {
        let summary = CONTEXT.config_done.wait().await;
        info!(
            "Configuration done: cube {} bytes, pools {} / {} bytes",
            summary.cube_bytes, summary.large_pool_usage, summary.local_pool_usage
        );

        if transport::spawn(link_periph).is_err() {
            defmt::panic!("transport task already running");
        }
        info!("Front-end may start frames");

        let mut last_frames = 0;
        loop {
            Mono::delay(5.secs()).await;
            let snap = CONTEXT.counters.snapshot();
            if snap.frames == last_frames {
                warn!("No frame start in the last 5 s");
            } else {
                info!(
                    "frames={} chirps={} chirps_available={} period={} cycles",
                    snap.frames,
                    snap.chirps,
                    snap.chirps_available,
                    CONTEXT.counters.frame_period_ticks()
                );
            }
            last_frames = snap.frames;
        }
    }

    /// Sends every handed-off cube to the host
    #[task(priority = 1)]
    async fn transport(_cx: transport::Context, link_periph: LinkPeripherals) -> ! {
        let config = TransportConfig::default();
        if let Err(e) = config.validate() {
            defmt::panic!("{}", e);
        }
        let sink = host_link(link_periph, config);
        let mut channel = TransportChannel::new(sink, &CONTEXT);
        channel.run().await
    }

    #[task(binds = EXTI0, priority = 3)]
    fn frame_start(_cx: frame_start::Context) {
        HUB.dispatch(TimingEvent::FrameStart);
    }

    #[task(binds = EXTI1, priority = 3)]
    fn chirp_start(_cx: chirp_start::Context) {
        HUB.dispatch(TimingEvent::ChirpStart);
    }

    #[task(binds = EXTI2, priority = 3)]
    fn chirp_available(_cx: chirp_available::Context) {
        HUB.dispatch(TimingEvent::ChirpAvailable);
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle(local = [timing_pins])]
    fn idle(cx: idle::Context) -> ! {
        let _pins = cx.local.timing_pins;
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
