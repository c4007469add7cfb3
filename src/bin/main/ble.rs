//! BLE central for the HID keyboard.
//!
//! Connects to the stored keyboard address when there is one, otherwise scans
//! for the first advertiser carrying the HID service and remembers it. Raw
//! report notifications are forwarded over a channel; the HAL keyboard driver
//! does the decoding.

use bt_hci::controller::ExternalController;
use embassy_futures::join::join;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use esp_radio::ble::controller::BleConnector;
use heapless::String as HeaplessString;
use log::{info, warn};
use trouble_host::prelude::*;

use wordly_core::config::KEYBOARD_ADDR_BYTES;
use wordly_core::input::report::KeyboardReport;
use wordly_hal_esp32s3::network::KeyboardLinkHandle;

use super::{FOUND_KEYBOARD_ADDR, ReportSender};

const HID_SERVICE_UUID: u16 = 0x1812;
const REPORT_CHAR_UUID: u16 = 0x2a4d;
const HCI_SLOTS: usize = 20;
const CONNECTIONS_MAX: usize = 1;
const L2CAP_CHANNELS_MAX: usize = 2;
const RETRY_DELAY_SECS: u64 = 3;

/// Captures the first advertiser whose AD payload lists the HID service,
/// along with its address type.
struct HidScanListener {
    found: Signal<CriticalSectionRawMutex, (AddrKind, BdAddr)>,
}

impl EventHandler for HidScanListener {
    fn on_adv_reports(&self, mut reports: LeAdvReportsIter<'_>) {
        while let Some(Ok(report)) = reports.next() {
            if adv_carries_hid(report.data) {
                self.found.signal((report.addr_kind, report.addr));
            }
        }
    }
}

/// Walks AD structures looking for 16-bit service UUID lists (types 0x02 and
/// 0x03) containing the HID service.
fn adv_carries_hid(data: &[u8]) -> bool {
    let mut rest = data;
    while let [len, body @ ..] = rest {
        let len = *len as usize;
        if len == 0 || len > body.len() {
            break;
        }
        let (ad, tail) = body.split_at(len);
        if let [ad_type, uuids @ ..] = ad
            && (*ad_type == 0x02 || *ad_type == 0x03)
        {
            for pair in uuids.chunks_exact(2) {
                if u16::from_le_bytes([pair[0], pair[1]]) == HID_SERVICE_UUID {
                    return true;
                }
            }
        }
        rest = tail;
    }
    false
}

/// "AA:BB:CC:DD:EE:FF" (display order) to the on-air little-endian form.
fn parse_bd_addr(text: &str) -> Option<BdAddr> {
    let mut bytes = [0u8; 6];
    let mut parts = text.split(':');
    for slot in bytes.iter_mut().rev() {
        let part = parts.next()?;
        *slot = u8::from_str_radix(part, 16).ok()?;
    }
    parts.next().is_none().then(|| BdAddr::new(bytes))
}

fn format_bd_addr(addr: &BdAddr) -> HeaplessString<KEYBOARD_ADDR_BYTES> {
    use core::fmt::Write;
    let raw = addr.raw();
    let mut out = HeaplessString::new();
    for (i, byte) in raw.iter().rev().enumerate() {
        if i > 0 {
            let _ = out.push(':');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

pub(super) async fn ble_task(
    connector: BleConnector<'_>,
    paired_addr: Option<HeaplessString<KEYBOARD_ADDR_BYTES>>,
    paired_addr_random: bool,
    reports: ReportSender,
    link: &'static KeyboardLinkHandle,
) -> ! {
    let controller: ExternalController<_, HCI_SLOTS> = ExternalController::new(connector);
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources)
        .set_random_address(Address::random([0xb4, 0x4a, 0xd2, 0x91, 0x9e, 0xc6]));
    let Host {
        central, mut runner, ..
    } = stack.build();

    let listener = HidScanListener {
        found: Signal::new(),
    };

    let central_loop = async {
        let mut central = central;
        let stored_kind = if paired_addr_random {
            AddrKind::RANDOM
        } else {
            AddrKind::PUBLIC
        };
        let mut target = paired_addr
            .as_ref()
            .and_then(|s| parse_bd_addr(s))
            .map(|addr| (stored_kind, addr));

        loop {
            link.set_connected(false);

            let (kind, addr) = match target {
                Some(target) => target,
                None => {
                    // Scan until something advertising HID shows up.
                    link.set_scanning(true);
                    listener.found.reset();
                    let mut scanner = Scanner::new(central);
                    let found = match scanner.scan(&ScanConfig::default()).await {
                        Ok(_session) => Some(listener.found.wait().await),
                        Err(err) => {
                            warn!("ble scan failed: {:?}", err);
                            None
                        }
                    };
                    central = scanner.into_inner();
                    link.set_scanning(false);

                    let Some((kind, addr)) = found else {
                        Timer::after_secs(RETRY_DELAY_SECS).await;
                        continue;
                    };
                    info!("keyboard found: {}", format_bd_addr(&addr).as_str());
                    FOUND_KEYBOARD_ADDR.signal((format_bd_addr(&addr), kind == AddrKind::RANDOM));
                    target = Some((kind, addr));
                    (kind, addr)
                }
            };

            // Connecting with the wrong address type never completes, so the
            // scanned type rides along with the address.
            let config = ConnectConfig {
                connect_params: Default::default(),
                scan_config: ScanConfig {
                    filter_accept_list: &[(kind, &addr)],
                    ..Default::default()
                },
            };

            let conn = match central.connect(&config).await {
                Ok(conn) => conn,
                Err(err) => {
                    warn!("keyboard connect failed: {:?}", err);
                    Timer::after_secs(RETRY_DELAY_SECS).await;
                    continue;
                }
            };
            info!("keyboard connected");
            link.set_connected(true);

            forward_reports(&stack, &conn, &reports).await;

            info!("keyboard disconnected");
            link.set_connected(false);
            Timer::after_secs(RETRY_DELAY_SECS).await;
        }
    };

    let _ = join(runner.run_with_handler(&listener), central_loop).await;
    unreachable!()
}

/// Subscribes to HID report notifications and pumps them into the channel
/// until the link drops.
async fn forward_reports<C: Controller, P: PacketPool>(
    stack: &Stack<'_, C, P>,
    conn: &Connection<'_, P>,
    reports: &ReportSender,
) {
    let client = match GattClient::<C, P, 10>::new(stack, conn).await {
        Ok(client) => client,
        Err(err) => {
            warn!("gatt client setup failed: {:?}", err);
            return;
        }
    };

    let pump = async {
        let services = match client
            .services_by_uuid(&Uuid::new_short(HID_SERVICE_UUID))
            .await
        {
            Ok(services) => services,
            Err(err) => {
                warn!("hid service discovery failed: {:?}", err);
                return;
            }
        };
        let Some(service) = services.first().cloned() else {
            warn!("peer has no hid service");
            return;
        };

        let report_char: Characteristic<[u8; 8]> = match client
            .characteristic_by_uuid(&service, &Uuid::new_short(REPORT_CHAR_UUID))
            .await
        {
            Ok(characteristic) => characteristic,
            Err(err) => {
                warn!("hid report characteristic missing: {:?}", err);
                return;
            }
        };

        let mut notifications = match client.subscribe(&report_char, false).await {
            Ok(listener) => listener,
            Err(err) => {
                warn!("hid subscribe failed: {:?}", err);
                return;
            }
        };

        loop {
            let data = notifications.next().await;
            if let Some(report) = KeyboardReport::from_notification(data.as_ref()) {
                // Drop reports when the queue is full; key repeat recovers.
                let _ = reports.try_send(report);
            }
        }
    };

    // The client task ends when the connection drops, which tears down the
    // notification pump with it.
    match select(client.task(), pump).await {
        embassy_futures::select::Either::First(_) | embassy_futures::select::Either::Second(_) => {}
    }
}
