//! Quit input handling

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key that requests a clean shutdown
pub const QUIT_KEY: char = 'q';

/// Whether a raw key code from a window key poll is the quit key.
///
/// Only the low byte is compared; a negative code means no key was pressed.
pub fn is_quit_key(key: i32) -> bool {
    key >= 0 && (key & 0xFF) as u8 == QUIT_KEY as u8
}

/// Cooperative quit flag shared between input listeners and the frame loop
#[derive(Debug, Clone, Default)]
pub struct QuitSignal {
    flag: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Watch stdin for the quit key on a background thread
    pub fn listen_stdin(&self) {
        let signal = self.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            signal.watch_lines(stdin.lock());
        });
    }

    /// Request quit on Ctrl-C. Must be called inside a tokio runtime.
    pub fn listen_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    signal.request();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });
    }

    fn watch_lines<R: BufRead>(&self, reader: R) {
        for line in reader.lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case(&QUIT_KEY.to_string()) => {
                    info!("Quit key pressed");
                    self.request();
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Stopped reading stdin: {}", e);
                    return;
                }
            }
        }
    }
}
