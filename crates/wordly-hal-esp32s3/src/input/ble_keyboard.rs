//! BLE keyboard driver: consumes HID reports pushed by the BLE worker task
//! and turns them into key-down events for the app.
//!
//! The GATT central itself runs as an async task in the firmware binary; this
//! driver owns only the report channel receiver and the link status handle,
//! so the app side stays free of radio types.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use log::warn;

use wordly_core::driver::{ConnectivityDriver, Driver};
use wordly_core::input::keymap::events_from_reports;
use wordly_core::input::report::KeyboardReport;
use wordly_core::input::{InputProvider, KeyEvent};

use crate::network::KeyboardLinkHandle;

pub const REPORT_QUEUE_DEPTH: usize = 8;
const EVENT_QUEUE_DEPTH: usize = 16;

pub type ReportChannel = Channel<CriticalSectionRawMutex, KeyboardReport, REPORT_QUEUE_DEPTH>;
pub type ReportSender =
    Sender<'static, CriticalSectionRawMutex, KeyboardReport, REPORT_QUEUE_DEPTH>;
pub type ReportReceiver =
    Receiver<'static, CriticalSectionRawMutex, KeyboardReport, REPORT_QUEUE_DEPTH>;

pub struct BleKeyboard {
    reports: ReportReceiver,
    link: &'static KeyboardLinkHandle,
    last_report: KeyboardReport,
    events: heapless::Deque<KeyEvent, EVENT_QUEUE_DEPTH>,
    ready: bool,
}

impl BleKeyboard {
    pub fn new(reports: ReportReceiver, link: &'static KeyboardLinkHandle) -> Self {
        Self {
            reports,
            link,
            last_report: KeyboardReport::empty(),
            events: heapless::Deque::new(),
            ready: false,
        }
    }
}

impl Driver for BleKeyboard {
    type Error = core::convert::Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.last_report = KeyboardReport::empty();
        self.events.clear();
        self.ready = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.events.clear();
        self.ready = false;
    }

    /// Drains pending reports and queues the key-down edges.
    fn tick(&mut self, _now_ms: u64) {
        if !self.ready {
            return;
        }

        while let Ok(report) = self.reports.try_receive() {
            // A disconnect clears held keys so reconnect edges start clean.
            if !self.link.is_connected() {
                self.last_report = KeyboardReport::empty();
            }
            for event in events_from_reports(&self.last_report, &report) {
                if self.events.push_back(event).is_err() {
                    warn!("keyboard event queue full, dropping");
                }
            }
            self.last_report = report;
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl ConnectivityDriver for BleKeyboard {
    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }
}

impl InputProvider for BleKeyboard {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self) -> Result<Option<KeyEvent>, Self::Error> {
        Ok(self.events.pop_front())
    }
}
