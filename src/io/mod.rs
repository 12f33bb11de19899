// Purpose - external interfaces: output backends and the computer-keyboard layout

pub mod cpal_output;
pub mod keyboard;
pub mod offline;

pub use cpal_output::{CpalBackend, CpalStream};
pub use keyboard::KeyKind;
pub use offline::{OfflineBackend, OfflineStream};
