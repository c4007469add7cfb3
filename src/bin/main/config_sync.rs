//! Debounced persistence of the device configuration.

use wordly_core::config::{ConfigStore, DeviceConfig};
use wordly_hal_esp32s3::storage::FlashConfigStore;

use super::CONFIG_SAVE_DEBOUNCE_MS;

pub(super) struct ConfigSyncState {
    last_saved: DeviceConfig,
    pending: Option<(DeviceConfig, u64)>,
}

impl ConfigSyncState {
    pub(super) fn new(initial: DeviceConfig) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn track_current(&mut self, current: DeviceConfig, now_ms: u64) {
        if current == self.last_saved {
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if *pending != current {
                    *pending = current;
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current, now_ms));
            }
        }
    }

    pub(super) fn flush_if_due(&mut self, store: Option<&mut FlashConfigStore>, now_ms: u64) {
        let Some((candidate, changed_at_ms)) = self.pending.clone() else {
            return;
        };

        if now_ms.saturating_sub(changed_at_ms) < CONFIG_SAVE_DEBOUNCE_MS {
            return;
        }

        match store {
            Some(store) => {
                if store.save(&candidate).is_ok() {
                    self.last_saved = candidate;
                    self.pending = None;
                } else {
                    // Keep pending changes and retry later if flash is temporarily unavailable.
                    self.pending = Some((candidate, now_ms));
                }
            }
            None => {
                self.last_saved = candidate;
                self.pending = None;
            }
        }
    }
}
