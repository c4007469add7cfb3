pub mod ble_keyboard;

pub use ble_keyboard::{BleKeyboard, REPORT_QUEUE_DEPTH, ReportChannel, ReportReceiver, ReportSender};
