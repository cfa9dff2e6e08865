#![deny(unsafe_code)]
//! Frame processing task
//!
//! ```text
//! Idle ─start─▶ Configuring ─▶ Triggering ─▶ Computing ─▶ HandingOff
//!                                   ▲                          │
//!                                   └──── AwaitingTransport ◀──┘
//! ```
//!
//! Configuration happens once: both pools are reset, the window and the
//! radar cube are carved out, the engine is configured, the config-done
//! signal is posted and the timing interrupts are registered. After that the
//! task alternates strictly between computing frame N, waiting for the
//! transport to finish with it, and triggering frame N+1.

use embassy_sync::blocking_mutex::raw::RawMutex;
use hal_abstractions::{
    BufferDescriptor, ComputeEngine, EngineCommand, InterruptController, TimingEvent,
};

use crate::config::{IrqPriorities, RadarConfig};
use crate::context::{ConfigSummary, RadarCube, SharedContext};
use crate::counters::{count_chirp_available, count_chirp_start, count_frame_start};
use crate::error::PipelineError;
use crate::interrupts::InterruptHub;
use crate::mem_pool::Arena;

/// Alignment of the window and the radar cube in their pools
const BUFFER_ALIGN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameState {
    Idle,
    Configuring,
    Triggering,
    Computing,
    HandingOff,
    AwaitingTransport,
}

/// Open the compute engine, mapping its status into a pipeline error
pub fn open_engine<E: ComputeEngine>(params: E::InitParams) -> Result<E, PipelineError> {
    E::init(params).map_err(PipelineError::EngineInit)
}

pub struct FrameProcessor<'a, 'c, E, M: RawMutex> {
    engine: E,
    config: RadarConfig,
    priorities: IrqPriorities,
    /// Large and local pool regions, consumed by `start`
    regions: Option<(&'a mut [u8], &'a mut [u8])>,
    context: &'c SharedContext<'a, M>,
    state: FrameState,
    cube: Option<RadarCube<'a>>,
    window: Option<&'a [u8]>,
    frames: u32,
}

impl<'a, 'c, E: ComputeEngine, M: RawMutex> FrameProcessor<'a, 'c, E, M> {
    /// `large` must be DMA-capable; it holds the radar cube
    pub fn new(
        engine: E,
        config: RadarConfig,
        priorities: IrqPriorities,
        large: &'a mut [u8],
        local: &'a mut [u8],
        context: &'c SharedContext<'a, M>,
    ) -> Self {
        Self {
            engine,
            config,
            priorities,
            regions: Some((large, local)),
            context,
            state: FrameState::Idle,
            cube: None,
            window: None,
            frames: 0,
        }
    }

    /// Configure the engine, register interrupts and trigger the first frame
    pub fn start<C, HM>(
        &mut self,
        hub: &InterruptHub<'_, C, HM>,
    ) -> Result<ConfigSummary, PipelineError>
    where
        C: InterruptController,
        HM: RawMutex,
    {
        let (large, local) = self
            .regions
            .take()
            .ok_or(PipelineError::AlreadyConfigured)?;
        self.transition(FrameState::Configuring);

        let layout = self.config.validate()?;
        let mut large = Arena::new(large);
        let mut local = Arena::new(local);

        let window = local.carve(self.config.window_bytes(), BUFFER_ALIGN)?;
        let cube = large.carve(layout.radar_cube_bytes(), BUFFER_ALIGN)?;

        let params = self.config.engine_params(
            &layout,
            BufferDescriptor::of(window),
            BufferDescriptor::of(cube),
        );
        self.engine
            .configure(&params, window)
            .map_err(PipelineError::EngineConfigure)?;

        let window: &'a [u8] = window;
        self.window = Some(window);
        self.cube = Some(RadarCube::new(cube));

        let summary = ConfigSummary {
            cube_bytes: layout.radar_cube_bytes(),
            large_pool_usage: large.usage(),
            local_pool_usage: local.usage(),
        };
        info!(
            "configured: cube {} bytes, large pool {} bytes, local pool {} bytes",
            summary.cube_bytes,
            summary.large_pool_usage,
            summary.local_pool_usage
        );
        self.context.config_done.signal(summary);

        let priorities = self.priorities;
        hub.register(
            TimingEvent::FrameStart,
            priorities.frame_start,
            count_frame_start,
        )?;
        hub.register(
            TimingEvent::ChirpStart,
            priorities.chirp_start,
            count_chirp_start,
        )?;
        hub.register(
            TimingEvent::ChirpAvailable,
            priorities.chirp_available,
            count_chirp_available,
        )?;

        self.trigger()?;
        Ok(summary)
    }

    /// Compute one frame, hand it to the transport and trigger the next
    pub async fn run_frame(&mut self) -> Result<(), PipelineError> {
        let mut cube = self.cube.take().ok_or(PipelineError::NotConfigured)?;

        self.transition(FrameState::Computing);
        match self.engine.process(cube.as_mut_bytes()).await {
            Ok(report) => trace!("frame {} computed in {} cycles", self.frames, report.cycles),
            Err(status) => {
                self.cube = Some(cube);
                return Err(PipelineError::Process(status));
            }
        }
        cube.set_frame_index(self.frames);
        self.frames = self.frames.wrapping_add(1);

        self.transition(FrameState::HandingOff);
        self.context.handshake.hand_off(cube).await;

        self.transition(FrameState::AwaitingTransport);
        let cube = self.context.handshake.wait_done().await;
        self.cube = Some(cube);

        self.trigger()
    }

    /// Configure, then process frames until something fatal happens
    pub async fn run<C, HM>(mut self, hub: &InterruptHub<'_, C, HM>) -> PipelineError
    where
        C: InterruptController,
        HM: RawMutex,
    {
        if let Err(e) = self.start(hub) {
            error!("configuration failed: {}", e);
            return e;
        }
        loop {
            if let Err(e) = self.run_frame().await {
                error!("frame {} failed: {}", self.frames, e);
                return e;
            }
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames computed and handed off so far
    pub fn frames_processed(&self) -> u32 {
        self.frames
    }

    /// Window coefficients as written by the engine, once configured
    pub fn window(&self) -> Option<&'a [u8]> {
        self.window
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn trigger(&mut self) -> Result<(), PipelineError> {
        self.transition(FrameState::Triggering);
        self.engine
            .control(EngineCommand::TriggerAcquire)
            .map_err(PipelineError::Trigger)
    }

    fn transition(&mut self, next: FrameState) {
        trace!("{} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use hal_abstractions::{EngineParams, EngineStatus, IrqError, ProcessReport};
    use heapless::Vec;

    use super::*;
    use crate::error::PoolError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Configure { window: usize, cube: usize },
        Trigger,
        Process,
    }

    #[derive(Default)]
    struct MockEngine {
        calls: Vec<Call, 16>,
        fail_configure: bool,
        fail_process: bool,
    }

    impl ComputeEngine for MockEngine {
        type InitParams = i32;

        fn init(status: i32) -> Result<Self, EngineStatus> {
            if status != 0 {
                return Err(EngineStatus(status));
            }
            Ok(Self::default())
        }

        fn configure(
            &mut self,
            params: &EngineParams,
            window: &mut [u8],
        ) -> Result<(), EngineStatus> {
            if self.fail_configure {
                return Err(EngineStatus(-3));
            }
            window.fill(0x5A);
            self.calls
                .push(Call::Configure {
                    window: params.window.len,
                    cube: params.radar_cube.len,
                })
                .unwrap();
            Ok(())
        }

        fn control(&mut self, command: EngineCommand) -> Result<(), EngineStatus> {
            assert_eq!(command, EngineCommand::TriggerAcquire);
            self.calls.push(Call::Trigger).unwrap();
            Ok(())
        }

        async fn process(&mut self, cube: &mut [u8]) -> Result<ProcessReport, EngineStatus> {
            if self.fail_process {
                return Err(EngineStatus(-7));
            }
            cube.fill(0xC3);
            self.calls.push(Call::Process).unwrap();
            Ok(ProcessReport { cycles: 42 })
        }
    }

    struct MockController {
        enabled: Cell<usize>,
        reject: bool,
    }

    impl InterruptController for MockController {
        fn set_priority(&self, _event: TimingEvent, _priority: u8) -> Result<(), IrqError> {
            if self.reject {
                return Err(IrqError::Unsupported);
            }
            Ok(())
        }

        fn enable(&self, _event: TimingEvent) {
            self.enabled.set(self.enabled.get() + 1);
        }

        fn clear(&self, _event: TimingEvent) {}

        fn timestamp(&self) -> u32 {
            0
        }
    }

    fn controller() -> MockController {
        MockController {
            enabled: Cell::new(0),
            reject: false,
        }
    }

    #[test]
    fn test_open_engine_maps_status() {
        assert!(open_engine::<MockEngine>(0).is_ok());
        assert_eq!(
            open_engine::<MockEngine>(-1).err(),
            Some(PipelineError::EngineInit(EngineStatus(-1)))
        );
    }

    #[test]
    fn test_start_configures_then_triggers() {
        let mut large = [0u8; 8192];
        let mut local = [0u8; 512];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let ctrl = controller();
        let hub: InterruptHub<'_, _, NoopRawMutex> = InterruptHub::new(&ctrl, &context.counters);

        let mut processor = FrameProcessor::new(
            MockEngine::default(),
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );
        assert_eq!(processor.state(), FrameState::Idle);

        let summary = processor.start(&hub).unwrap();
        assert_eq!(summary.cube_bytes, 6144);
        assert!(summary.large_pool_usage >= 6144);
        assert!(summary.local_pool_usage >= 256);

        assert_eq!(processor.state(), FrameState::Triggering);
        assert_eq!(
            processor.engine().calls.as_slice(),
            &[
                Call::Configure {
                    window: 256,
                    cube: 6144,
                },
                Call::Trigger,
            ]
        );
        assert_eq!(context.config_done.try_take(), Some(summary));
        assert_eq!(ctrl.enabled.get(), 3);
        for event in TimingEvent::ALL {
            assert!(hub.is_registered(event));
        }

        let window = processor.window().unwrap();
        assert_eq!(window.len(), 256);
        assert!(window.iter().all(|&b| b == 0x5A));

        assert_eq!(
            processor.start(&hub).err(),
            Some(PipelineError::AlreadyConfigured)
        );
    }

    #[test]
    fn test_cube_larger_than_pool_is_fatal() {
        let mut large = [0u8; 4096];
        let mut local = [0u8; 512];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let ctrl = controller();
        let hub: InterruptHub<'_, _, NoopRawMutex> = InterruptHub::new(&ctrl, &context.counters);

        let mut processor = FrameProcessor::new(
            MockEngine::default(),
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );

        match processor.start(&hub) {
            Err(PipelineError::Alloc(PoolError::Exhausted { requested, .. })) => {
                assert_eq!(requested, 6144)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!context.config_done.signaled());
        assert_eq!(ctrl.enabled.get(), 0);
    }

    #[test]
    fn test_configure_failure_stops_before_signal() {
        let mut large = [0u8; 8192];
        let mut local = [0u8; 512];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let ctrl = controller();
        let hub: InterruptHub<'_, _, NoopRawMutex> = InterruptHub::new(&ctrl, &context.counters);

        let engine = MockEngine {
            fail_configure: true,
            ..MockEngine::default()
        };
        let mut processor = FrameProcessor::new(
            engine,
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );

        assert_eq!(
            processor.start(&hub).err(),
            Some(PipelineError::EngineConfigure(EngineStatus(-3)))
        );
        assert!(!context.config_done.signaled());
        assert!(processor.engine().calls.is_empty());
    }

    #[test]
    fn test_registration_failure_is_fatal() {
        let mut large = [0u8; 8192];
        let mut local = [0u8; 512];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let ctrl = MockController {
            enabled: Cell::new(0),
            reject: true,
        };
        let hub: InterruptHub<'_, _, NoopRawMutex> = InterruptHub::new(&ctrl, &context.counters);

        let mut processor = FrameProcessor::new(
            MockEngine::default(),
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );

        assert_eq!(
            processor.start(&hub).err(),
            Some(PipelineError::InterruptRegistration {
                event: TimingEvent::FrameStart,
                cause: IrqError::Unsupported,
            })
        );
        // no trigger without interrupts
        assert_eq!(processor.engine().calls.len(), 1);
    }

    #[test]
    fn test_frame_before_start() {
        let mut large = [0u8; 16];
        let mut local = [0u8; 16];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let mut processor = FrameProcessor::new(
            MockEngine::default(),
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );

        assert_eq!(
            block_on(processor.run_frame()),
            Err(PipelineError::NotConfigured)
        );
    }

    #[test]
    fn test_process_failure_keeps_cube() {
        let mut large = [0u8; 8192];
        let mut local = [0u8; 512];
        let context: SharedContext<'_, NoopRawMutex> = SharedContext::new();
        let ctrl = controller();
        let hub: InterruptHub<'_, _, NoopRawMutex> = InterruptHub::new(&ctrl, &context.counters);

        let engine = MockEngine {
            fail_process: true,
            ..MockEngine::default()
        };
        let mut processor = FrameProcessor::new(
            engine,
            RadarConfig::default(),
            IrqPriorities::default(),
            &mut large,
            &mut local,
            &context,
        );
        processor.start(&hub).unwrap();

        assert_eq!(
            block_on(processor.run_frame()),
            Err(PipelineError::Process(EngineStatus(-7)))
        );
        assert_eq!(processor.state(), FrameState::Computing);
        assert_eq!(processor.frames_processed(), 0);
        assert!(!context.handshake.in_flight());
    }
}
