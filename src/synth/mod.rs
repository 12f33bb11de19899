// Purpose: voice management, polyphony and the control/render split.
// The control side (Controller, Monitor) and the render side (Engine) only
// talk through lock-free SPSC rings created in `build`.

pub mod control;
pub mod engine;
pub mod message;
pub mod monitor;
pub mod pool;
pub mod voice;

use rtrb::RingBuffer;

use crate::{config::EngineConfig, error::SynthError};

pub use control::Controller;
pub use engine::Engine;
pub use message::{ControlCommand, MessageReceiver, NoteId};
pub use monitor::{EngineStatus, Monitor};
pub use pool::{ParamPolicy, VoicePool};
pub use voice::Voice;

/// The three ends of a configured engine.
///
/// `engine` moves into the render context; `controller` and `monitor` stay
/// with the caller.
pub struct EngineParts {
    pub controller: Controller,
    pub engine: Engine,
    pub monitor: Monitor,
}

/// Validate `config` and wire up the command and diagnostics rings.
pub fn build(config: &EngineConfig) -> Result<EngineParts, SynthError> {
    config.validate()?;

    let (tx, rx) = RingBuffer::<ControlCommand>::new(config.queue_capacity);
    let (tap, monitor) = monitor::monitor(config.scope_capacity);

    let engine = Engine::new(config, rx)?.with_monitor(tap);
    let controller = Controller::new(tx, config);

    log::debug!(
        "engine built: {} voices at {} Hz, {} channel(s)",
        config.max_voices,
        config.sample_rate,
        config.channels
    );

    Ok(EngineParts {
        controller,
        engine,
        monitor,
    })
}
