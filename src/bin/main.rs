#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::{Duration as EmbassyDuration, Timer, WithTimeout};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    dma_buffers,
    gpio::{Level, Output, OutputConfig},
    i2s::master::{DataFormat, I2s, Standard},
    spi::master::Spi,
    time::{Instant, Rate},
    timer::timg::TimerGroup,
};
use esp_radio::ble::controller::BleConnector;
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use heapless::String as HeaplessString;
use log::{LevelFilter, info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::options::{ColorInversion, Orientation, Rotation};
use mipidsi::{Builder as MipidsiBuilder, models::ST7789};
use static_cell::StaticCell;

use wordly_core::{
    app::{AppState, Command, DictionaryApp, HealthSnapshot, StatePolicy, TickResult},
    config::{ConfigStore, DeviceConfig, KEYBOARD_ADDR_BYTES, WifiCredentials},
    dictionary::{DictionaryResult, WORD_BYTES},
    driver::{ConnectivityDriver, Driver},
};
use wordly_hal_esp32s3::{
    audio::{Mp3Player, PcmSink},
    input::{BleKeyboard, ReportChannel, ReportSender},
    network::{KeyboardLinkHandle, WifiHandle},
    render::ScreenRenderer,
    storage::FlashConfigStore,
};

use audio::AudioRequest;
use config_sync::ConfigSyncState;

#[path = "main/audio.rs"]
mod audio;
#[path = "main/ble.rs"]
mod ble;
#[path = "main/config_sync.rs"]
mod config_sync;
#[path = "main/lookup.rs"]
mod lookup;

const DISPLAY_SPI_HZ: u32 = 40_000_000;
const AUDIO_SAMPLE_RATE_HZ: u32 = 44_100;
const CONFIG_SAVE_DEBOUNCE_MS: u64 = 1_500;
const WIFI_RETRY_BACKOFF_MIN_SECS: u64 = 2;
const WIFI_RETRY_BACKOFF_MAX_SECS: u64 = 120;
const NETWORK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;

const DICT_LOOKUP_URL: &str = "http://dict.wordly.dev/api/define";
const AUDIO_BASE_URL: &str = "http://dict.wordly.dev/api/audio";

// Compile-time fallback credentials for boards with blank flash config.
const WIFI_SSID: &str = match option_env!("WORDLY_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("WORDLY_WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};

static WIFI: WifiHandle = WifiHandle::new();
static KEYBOARD_LINK: KeyboardLinkHandle = KeyboardLinkHandle::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();
static REPORTS: ReportChannel = Channel::new();
static LOOKUP_REQUESTS: Channel<CriticalSectionRawMutex, HeaplessString<WORD_BYTES>, 2> =
    Channel::new();
static LOOKUP_RESULTS: Channel<CriticalSectionRawMutex, DictionaryResult, 2> = Channel::new();
static AUDIO_REQUESTS: Channel<CriticalSectionRawMutex, AudioRequest, 2> = Channel::new();
static FOUND_KEYBOARD_ADDR: Signal<
    CriticalSectionRawMutex,
    (HeaplessString<KEYBOARD_ADDR_BYTES>, bool),
> = Signal::new();
static WIFI_CREDENTIALS: Signal<CriticalSectionRawMutex, WifiCredentials> = Signal::new();
static VOLUME_PCT: AtomicU8 = AtomicU8::new(wordly_core::config::DEFAULT_VOLUME_PCT);

type LookupRequestReceiver =
    Receiver<'static, CriticalSectionRawMutex, HeaplessString<WORD_BYTES>, 2>;
type LookupResultSender = Sender<'static, CriticalSectionRawMutex, DictionaryResult, 2>;
type AudioRequestReceiver = Receiver<'static, CriticalSectionRawMutex, AudioRequest, 2>;

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn wifi_retry_backoff_secs(consecutive_failures: u32) -> u64 {
    // 2, 4, 8, 16, 32, 64, 120, 120, ...
    let shift = consecutive_failures.min(6);
    WIFI_RETRY_BACKOFF_MIN_SECS
        .saturating_mul(1u64 << shift)
        .min(WIFI_RETRY_BACKOFF_MAX_SECS)
}

async fn wait_before_wifi_retry(
    consecutive_failures: &mut u32,
    credentials: &Signal<CriticalSectionRawMutex, WifiCredentials>,
) {
    let delay_secs = wifi_retry_backoff_secs(*consecutive_failures);
    *consecutive_failures = consecutive_failures.saturating_add(1);
    info!(
        "wifi retrying in {}s (consecutive_failures={})",
        delay_secs, *consecutive_failures
    );
    match select(Timer::after_secs(delay_secs), credentials.wait()).await {
        Either::First(()) => {}
        Either::Second(new) => {
            // Fresh credentials cut the backoff short; the connection loop
            // picks them up at its top.
            credentials.signal(new);
            *consecutive_failures = 0;
        }
    }
}

/// Points the station at the given network. Failures are logged, not fatal:
/// credentials can always be re-entered on the WiFi settings screen.
fn apply_wifi_credentials(wifi_controller: &mut WifiController<'_>, credentials: &WifiCredentials) {
    let client_config = ClientConfig::default()
        .with_ssid(credentials.ssid.as_str().into())
        .with_password(credentials.password.as_str().into());
    if let Err(err) = wifi_controller.set_config(&ModeConfig::Client(client_config)) {
        warn!("wifi mode config failed: {:?}", err);
    }
}

async fn wifi_connection_loop(
    wifi_controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    wifi: &'static WifiHandle,
    credentials: &Signal<CriticalSectionRawMutex, WifiCredentials>,
) -> ! {
    let mut consecutive_failures = 0u32;

    'connect: loop {
        if let Some(new) = credentials.try_take() {
            info!("switching wifi to \"{}\"", new.ssid);
            let _ = wifi_controller.disconnect_async().await;
            apply_wifi_credentials(wifi_controller, &new);
            consecutive_failures = 0;
        }

        wifi.mark_connecting();

        if !wifi_controller.is_started().unwrap_or(false) {
            if let Err(err) = wifi_controller.start_async().await {
                info!("wifi start failed: {:?}", err);
                wifi.mark_disconnected();
                wait_before_wifi_retry(&mut consecutive_failures, credentials).await;
                continue;
            }
        }

        if let Err(err) = wifi_controller.connect_async().await {
            info!("wifi connect failed: {:?}", err);
            wifi.mark_disconnected();
            let _ = wifi_controller.disconnect_async().await;
            wait_before_wifi_retry(&mut consecutive_failures, credentials).await;
            continue;
        }

        match stack
            .wait_config_up()
            .with_timeout(EmbassyDuration::from_secs(DHCP_TIMEOUT_SECS))
            .await
        {
            Ok(()) => {
                wifi.update_link_ip(stack.is_link_up(), stack.config_v4().is_some());
                info!("wifi connected and dhcp ready");
            }
            Err(_) => {
                info!("dhcp timeout; forcing reconnect");
                wifi.update_link_ip(stack.is_link_up(), false);
                let _ = wifi_controller.disconnect_async().await;
                wait_before_wifi_retry(&mut consecutive_failures, credentials).await;
                continue;
            }
        }

        consecutive_failures = 0;

        loop {
            if credentials.signaled() {
                info!("new wifi credentials; reconnecting");
                let _ = wifi_controller.disconnect_async().await;
                continue 'connect;
            }

            let link_up = stack.is_link_up();
            let has_ipv4 = stack.config_v4().is_some();
            let is_connected = matches!(wifi_controller.is_connected(), Ok(true));

            wifi.update_link_ip(link_up, has_ipv4);

            if !(link_up && has_ipv4 && is_connected) {
                info!(
                    "wifi state lost (link_up={} has_ipv4={} connected={}); reconnecting",
                    link_up, has_ipv4, is_connected
                );
                break;
            }

            Timer::after_millis(NETWORK_POLL_INTERVAL_MS).await;
        }

        wifi.mark_disconnected();
        let _ = wifi_controller.disconnect_async().await;
        wait_before_wifi_retry(&mut consecutive_failures, credentials).await;
    }
}

// Largest PCM slice a single MP3 frame can produce.
const PCM_FRAME_SAMPLES: usize = 2304;

/// I2S DMA sink. `write` blocks until the circular buffer has taken the whole
/// frame, which at 44.1kHz stereo is comfortably faster than decode.
struct I2sPcmSink<'d> {
    transfer: esp_hal::i2s::master::I2sWriteDmaTransfer<'d, esp_hal::Blocking>,
    rate_warned: bool,
}

impl<'d> I2sPcmSink<'d> {
    fn new(transfer: esp_hal::i2s::master::I2sWriteDmaTransfer<'d, esp_hal::Blocking>) -> Self {
        Self {
            transfer,
            rate_warned: false,
        }
    }
}

impl PcmSink for I2sPcmSink<'_> {
    type Error = esp_hal::i2s::master::Error;

    fn write(&mut self, pcm: &[i16], sample_rate: u32, channels: u8) -> Result<(), Self::Error> {
        if sample_rate != AUDIO_SAMPLE_RATE_HZ && !self.rate_warned {
            warn!(
                "stream sample rate {} != i2s rate {}; playing off-speed",
                sample_rate, AUDIO_SAMPLE_RATE_HZ
            );
            self.rate_warned = true;
        }

        // I2S is configured for stereo frames; duplicate mono samples.
        let mut bytes = [0u8; 4 * PCM_FRAME_SAMPLES];
        let mut len = 0usize;
        for &sample in pcm {
            let le = sample.to_le_bytes();
            bytes[len] = le[0];
            bytes[len + 1] = le[1];
            len += 2;
            if channels == 1 {
                bytes[len] = le[0];
                bytes[len + 1] = le[1];
                len += 2;
            }
        }

        let mut offset = 0usize;
        while offset < len {
            offset += self.transfer.push(&bytes[offset..len])?;
        }
        Ok(())
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: wordly starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio (wifi + ble) requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 98304);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Display wiring: SCK=GPIO12, MOSI=GPIO11, CS=GPIO10, DC=GPIO13,
    // RST=GPIO14, BL=GPIO21
    let spi_config = esp_hal::spi::master::Config::default()
        .with_frequency(Rate::from_hz(DISPLAY_SPI_HZ))
        .with_mode(esp_hal::spi::Mode::_0);
    let spi = Spi::new(peripherals.SPI2, spi_config)
        .unwrap()
        .with_sck(peripherals.GPIO12)
        .with_mosi(peripherals.GPIO11);
    let cs = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO13, Level::Low, OutputConfig::default());
    let rst = Output::new(peripherals.GPIO14, Level::High, OutputConfig::default());
    let _backlight = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    let spi_device = ExclusiveDevice::new_no_delay(spi, cs).unwrap();
    let mut delay = Delay::new();
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);
    let mut display = match MipidsiBuilder::new(ST7789, di)
        .display_size(240, 320)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .invert_colors(ColorInversion::Inverted)
        .reset_pin(rst)
        .init(&mut delay)
    {
        Ok(display) => display,
        Err(err) => {
            info!("display init failed: {:?}", err);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };
    esp_println::println!("display: init ok");

    let mut config_store = match FlashConfigStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            info!("config storage unavailable ({:?}); settings will be volatile", err);
            None
        }
    };

    let mut device_config = match config_store.as_mut().map(|store| store.load()) {
        Some(Ok(Some(saved))) => {
            info!("config restored from flash");
            saved
        }
        Some(Ok(None)) => {
            info!("no saved config in flash");
            DeviceConfig::default()
        }
        Some(Err(err)) => {
            info!("config load failed ({:?}); using defaults", err);
            DeviceConfig::default()
        }
        None => DeviceConfig::default(),
    };

    if device_config.wifi.is_none() && !WIFI_SSID.is_empty() {
        device_config.wifi = WifiCredentials::new(WIFI_SSID, WIFI_PASSWORD);
        info!("wifi credentials taken from build environment");
    }
    VOLUME_PCT.store(device_config.volume_pct, Ordering::Relaxed);

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                loop {
                    Timer::after_secs(1).await;
                }
            }
        };

    let initial_wifi = device_config.wifi.clone().unwrap_or_default();
    apply_wifi_credentials(&mut wifi_controller, &initial_wifi);

    let ble_connector = BleConnector::new(&radio, peripherals.BT);

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        0x7E11_39C4_A2B8_06D5,
    );

    // Audio path: I2S wiring BCLK=GPIO5, WS=GPIO6, DOUT=GPIO7
    let (_, _, tx_buffer, tx_descriptors) = dma_buffers!(0, 8192);
    let i2s = I2s::new(
        peripherals.I2S1,
        Standard::Philips,
        DataFormat::Data16Channel16,
        Rate::from_hz(AUDIO_SAMPLE_RATE_HZ),
        peripherals.DMA_CH1,
    );
    let i2s_tx = i2s
        .i2s_tx
        .with_bclk(peripherals.GPIO5)
        .with_ws(peripherals.GPIO6)
        .with_dout(peripherals.GPIO7)
        .build(tx_descriptors);
    let mut player = match i2s_tx.write_dma_circular(tx_buffer) {
        Ok(transfer) => Some(Mp3Player::new(
            I2sPcmSink::new(transfer),
            device_config.volume_pct,
        )),
        Err(err) => {
            info!("i2s dma setup failed: {:?}; audio disabled", err);
            None
        }
    };

    // Drivers and the app.
    let mut wifi_link = wordly_hal_esp32s3::network::WifiLink::new(&WIFI);
    let _ = wifi_link.initialize();

    let mut keyboard = BleKeyboard::new(REPORTS.receiver(), &KEYBOARD_LINK);
    let _ = keyboard.initialize();

    let mut app = DictionaryApp::new(keyboard, StatePolicy::default(), device_config.volume_pct);
    app.set_network_labels(
        &initial_wifi.ssid,
        device_config.keyboard_addr.as_deref().unwrap_or(""),
    );

    let renderer = ScreenRenderer::new();
    let mut config_sync = ConfigSyncState::new(device_config.clone());
    let mut last_wifi_revision = u32::MAX;
    let mut last_keyboard_revision = u32::MAX;

    let loop_start = Instant::now();

    info!("Display pins: SCK=GPIO12 MOSI=GPIO11 CS=GPIO10 DC=GPIO13 RST=GPIO14 BL=GPIO21");
    info!("I2S pins: BCLK=GPIO5 WS=GPIO6 DOUT=GPIO7");
    info!(
        "Dictionary backend: {} audio: {} sample_rate={}",
        DICT_LOOKUP_URL, AUDIO_BASE_URL, AUDIO_SAMPLE_RATE_HZ
    );

    WIFI.mark_connecting();

    let net_future = net_runner.run();
    let wifi_future = wifi_connection_loop(&mut wifi_controller, stack, &WIFI, &WIFI_CREDENTIALS);
    let ble_future = ble::ble_task(
        ble_connector,
        device_config.keyboard_addr.clone(),
        device_config.keyboard_addr_random,
        REPORTS.sender(),
        &KEYBOARD_LINK,
    );
    let lookup_future = lookup::lookup_task(stack, LOOKUP_REQUESTS.receiver(), LOOKUP_RESULTS.sender());
    let audio_future = async {
        match player.as_mut() {
            Some(player) => audio::audio_task(stack, AUDIO_REQUESTS.receiver(), player).await,
            None => loop {
                // Audio disabled; drain requests so the queue never blocks.
                let _ = AUDIO_REQUESTS.receive().await;
            },
        }
    };

    let ui_future = async {
        loop {
            let now_ms = loop_start.elapsed().as_millis();

            app.input_mut().tick(now_ms);
            let keyboard_health = {
                let keyboard = &*app.input_mut();
                keyboard
                    .is_ready()
                    .then(|| ConnectivityDriver::is_connected(keyboard))
            };
            let wifi_snapshot = WIFI.snapshot();
            let health = HealthSnapshot {
                wifi: wifi_link.is_ready().then(|| wifi_link.is_connected()),
                keyboard: keyboard_health,
            };

            let app_requests_render = app.tick(now_ms, health) == TickResult::RenderRequested;

            while let Some(command) = app.take_command() {
                match command {
                    Command::Lookup(word) => {
                        if LOOKUP_REQUESTS.try_send(word).is_err() {
                            warn!("lookup queue full, dropping request");
                        }
                    }
                    Command::PlayAudio { word, kind } => {
                        if AUDIO_REQUESTS.try_send(AudioRequest { word, kind }).is_err() {
                            warn!("audio queue full, dropping request");
                        }
                    }
                    Command::SetVolume(volume_pct) => {
                        VOLUME_PCT.store(volume_pct, Ordering::Relaxed);
                    }
                    Command::ConnectWifi(credentials) => {
                        info!("wifi credentials entered for \"{}\"", credentials.ssid);
                        device_config.wifi = Some(credentials.clone());
                        WIFI.mark_connecting();
                        WIFI_CREDENTIALS.signal(credentials);
                    }
                    Command::PrintMemoryStatus => {
                        info!("heap: {}", esp_alloc::HEAP.stats());
                    }
                }
            }

            if let Ok(result) = LOOKUP_RESULTS.try_receive() {
                app.apply_lookup_result(result);
            }

            if let Some((addr, addr_random)) = FOUND_KEYBOARD_ADDR.try_take() {
                info!(
                    "pairing keyboard {} ({})",
                    addr.as_str(),
                    if addr_random { "random" } else { "public" }
                );
                device_config.keyboard_addr = Some(addr);
                device_config.keyboard_addr_random = addr_random;
                let ssid_label = device_config
                    .wifi
                    .as_ref()
                    .map(|w| w.ssid.clone())
                    .unwrap_or_default();
                app.set_network_labels(
                    &ssid_label,
                    device_config.keyboard_addr.as_deref().unwrap_or(""),
                );
            }

            let keyboard_revision = KEYBOARD_LINK.revision();
            let links_changed = wifi_snapshot.revision != last_wifi_revision
                || keyboard_revision != last_keyboard_revision;

            if app_requests_render || links_changed {
                app.with_screen(now_ms, |screen| {
                    if renderer.render(screen, &mut display).is_err() {
                        warn!("display render failed");
                    }
                });
                last_wifi_revision = wifi_snapshot.revision;
                last_keyboard_revision = keyboard_revision;
            }

            device_config.volume_pct = app.volume_pct();
            config_sync.track_current(device_config.clone(), now_ms);
            config_sync.flush_if_due(config_store.as_mut(), now_ms);

            // Splash progress only needs coarse ticks; typing stays snappy.
            let tick_ms = if app.state() == AppState::Splash { 20 } else { 1 };
            Timer::after_millis(tick_ms).await;
        }
    };

    let _ = embassy_futures::join::join5(
        net_future,
        wifi_future,
        ble_future,
        embassy_futures::join::join(lookup_future, audio_future),
        ui_future,
    )
    .await;
    unreachable!()
}
