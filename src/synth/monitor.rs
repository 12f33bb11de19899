//! Read-only diagnostics for the control side.
//!
//! The render side pushes its mono mix and a small status record into two
//! SPSC rings after every block, dropping data when a ring is full. The
//! [`Monitor`] drains them from the control side and keeps its own copies, so
//! nothing it does can stall rendering.

use rtrb::{Consumer, Producer, RingBuffer};

/// Render-side counters, published once per render invocation. `Copy` so it
/// crosses the ring without allocating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub active_voices: usize,
    pub stolen_voices: u64,
    pub rejected_commands: u64,
    pub frames_rendered: u64,
    /// Set once a render call failed its buffer checks; output is silent after.
    pub faulted: bool,
}

const STATUS_QUEUE_SIZE: usize = 32;

/// Render-side ends of the diagnostic rings.
pub struct MonitorTap {
    pub(crate) scope_tx: Producer<f32>,
    pub(crate) status_tx: Producer<EngineStatus>,
}

impl MonitorTap {
    /// Copy a block into the scope ring; whatever does not fit is dropped.
    ///
    /// The render side cannot evict old samples, so once the ring is full the
    /// newest ones are lost. The scope only shows the latest block when the
    /// monitor polls at least once per `scope_capacity` samples.
    pub(crate) fn push_block(&mut self, block: &[f32]) {
        let n = block.len().min(self.scope_tx.slots());
        for &sample in &block[..n] {
            if self.scope_tx.push(sample).is_err() {
                break;
            }
        }
    }

    /// Queue a status record. The last free slot is held back for a faulted
    /// status, so a fault still gets through to a monitor that fell behind.
    pub(crate) fn push_status(&mut self, status: EngineStatus) {
        if status.faulted || self.status_tx.slots() > 1 {
            let _ = self.status_tx.push(status);
        }
    }
}

pub struct Monitor {
    scope_rx: Consumer<f32>,
    status_rx: Consumer<EngineStatus>,
    scope: Vec<f32>,
    capacity: usize,
    status: EngineStatus,
}

/// Create both ends of the diagnostics path. `scope_capacity` is the number
/// of recent samples the monitor keeps.
pub fn monitor(scope_capacity: usize) -> (MonitorTap, Monitor) {
    let capacity = scope_capacity.max(1);
    let (scope_tx, scope_rx) = RingBuffer::<f32>::new(capacity);
    let (status_tx, status_rx) = RingBuffer::<EngineStatus>::new(STATUS_QUEUE_SIZE);

    let tap = MonitorTap {
        scope_tx,
        status_tx,
    };
    let monitor = Monitor {
        scope_rx,
        status_rx,
        scope: Vec::with_capacity(capacity),
        capacity,
        status: EngineStatus::default(),
    };
    (tap, monitor)
}

impl Monitor {
    /// Drain both rings. Returns the number of new scope samples.
    ///
    /// Logs when the render side starts rejecting commands or faults.
    pub fn poll(&mut self) -> usize {
        let mut received = 0;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            received += 1;
        }
        if self.scope.len() > self.capacity {
            let excess = self.scope.len() - self.capacity;
            self.scope.drain(0..excess);
        }

        let previous = self.status;
        while let Ok(status) = self.status_rx.pop() {
            self.status = status;
        }
        if self.status.rejected_commands > previous.rejected_commands {
            log::warn!(
                "render side ignored {} malformed command(s)",
                self.status.rejected_commands - previous.rejected_commands
            );
        }
        if self.status.stolen_voices > previous.stolen_voices {
            log::debug!(
                "voice pool exhausted, {} voice(s) stolen",
                self.status.stolen_voices - previous.stolen_voices
            );
        }
        if self.status.faulted && !previous.faulted {
            log::error!("render loop faulted on a malformed output buffer; output is muted");
        }

        received
    }

    /// Owned copy of the scope samples, oldest first. This is the latest
    /// output as long as polls keep up with the scope ring; after a longer
    /// gap it is the oldest output the ring managed to hold.
    pub fn snapshot(&self) -> Vec<f32> {
        self.scope.clone()
    }

    /// Most recent samples, borrowed from the monitor's own buffer.
    pub fn scope(&self) -> &[f32] {
        &self.scope
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }
}
