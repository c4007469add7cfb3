use super::*;
use crate::dictionary::parse_result;
use crate::input::mock::ScriptedInput;
use crate::input::{FunctionKey, Key};
use crate::view::{LookupView, Screen, WifiSetupView};

const UP: HealthSnapshot = HealthSnapshot {
    wifi: Some(true),
    keyboard: Some(true),
};
const WIFI_DOWN: HealthSnapshot = HealthSnapshot {
    wifi: Some(false),
    keyboard: Some(true),
};
const KEYBOARD_DOWN: HealthSnapshot = HealthSnapshot {
    wifi: Some(true),
    keyboard: Some(false),
};

fn make_app() -> DictionaryApp<ScriptedInput> {
    DictionaryApp::new(ScriptedInput::new(), StatePolicy::default(), 70)
}

/// Runs the splash to completion with healthy links; lands in MAIN at t=3000.
fn boot_to_main(app: &mut DictionaryApp<ScriptedInput>) {
    let _ = app.tick(0, UP);
    let _ = app.tick(3_000, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn splash_holds_until_minimum_dwell() {
    let mut app = make_app();
    let _ = app.tick(0, UP);
    let _ = app.tick(2_999, UP);
    assert_eq!(app.state(), AppState::Splash);

    let _ = app.tick(3_000, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn splash_times_out_into_wifi_settings_without_connectivity() {
    let mut app = make_app();
    let down = HealthSnapshot {
        wifi: Some(false),
        keyboard: None,
    };
    let _ = app.tick(0, down);
    let _ = app.tick(9_999, down);
    assert_eq!(app.state(), AppState::Splash);

    let _ = app.tick(10_000, down);
    assert_eq!(app.state(), AppState::WifiSettings);
}

#[test]
fn wifi_loss_in_main_triggers_recovery() {
    let mut app = make_app();
    boot_to_main(&mut app);

    // First health check after entering MAIN.
    let _ = app.tick(3_100, WIFI_DOWN);
    assert_eq!(app.state(), AppState::WifiSettings);
}

#[test]
fn recovery_returns_to_main_when_service_heals() {
    let mut app = make_app();
    boot_to_main(&mut app);
    let _ = app.tick(3_100, WIFI_DOWN);
    assert_eq!(app.state(), AppState::WifiSettings);

    let _ = app.tick(5_200, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn flapping_link_is_rate_limited_by_cooldown() {
    let mut app = make_app();
    boot_to_main(&mut app);

    let _ = app.tick(3_100, WIFI_DOWN);
    assert_eq!(app.state(), AppState::WifiSettings);
    let _ = app.tick(5_200, UP);
    assert_eq!(app.state(), AppState::Main);

    // Down again inside the 5s cooldown: no transition.
    let _ = app.tick(7_300, WIFI_DOWN);
    assert_eq!(app.state(), AppState::Main);

    // Cooldown expired (armed at 3100): transition fires.
    let _ = app.tick(9_400, WIFI_DOWN);
    assert_eq!(app.state(), AppState::WifiSettings);
}

#[test]
fn keyboard_loss_enters_keyboard_settings() {
    let mut app = make_app();
    boot_to_main(&mut app);

    let _ = app.tick(3_100, KEYBOARD_DOWN);
    assert_eq!(app.state(), AppState::KeyboardSettings);

    let _ = app.tick(5_200, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn wifi_outranks_keyboard_when_both_fail() {
    let mut app = make_app();
    boot_to_main(&mut app);

    let both = HealthSnapshot {
        wifi: Some(false),
        keyboard: Some(false),
    };
    let _ = app.tick(3_100, both);
    assert_eq!(app.state(), AppState::WifiSettings);
}

#[test]
fn absent_drivers_never_force_transitions() {
    let mut app = make_app();
    boot_to_main(&mut app);

    let absent = HealthSnapshot {
        wifi: None,
        keyboard: None,
    };
    for t in [3_100u64, 6_000, 9_000, 20_000] {
        let _ = app.tick(t, absent);
        assert_eq!(app.state(), AppState::Main);
    }
}

#[test]
fn typed_entry_submits_a_lookup_command() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut().type_str("apple");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_100, UP);

    match app.take_command() {
        Some(Command::Lookup(word)) => assert_eq!(word, "apple"),
        other => panic!("expected lookup command, got {other:?}"),
    }
    assert!(app.take_command().is_none());
}

#[test]
fn invalid_entries_are_rejected_locally() {
    let mut app = make_app();
    boot_to_main(&mut app);

    // Empty entry.
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_100, UP);
    assert!(app.take_command().is_none());

    // The literal "null", any case.
    app.input_mut().type_str("NULL");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_200, UP);
    assert!(app.take_command().is_none());
}

#[test]
fn lookup_result_reaches_the_screen() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut().type_str("apple");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_100, UP);
    let _ = app.take_command();

    app.apply_lookup_result(parse_result(
        r#"{"word":"apple","explanation":"a fruit","sample_sentence":"I ate an apple."}"#,
    ));

    app.with_screen(3_200, |screen| match screen {
        Screen::Main { lookup, .. } => match lookup {
            LookupView::Entry {
                word,
                explanation,
                sample_sentence,
            } => {
                assert_eq!(word, "apple");
                assert_eq!(explanation, "a fruit");
                assert_eq!(sample_sentence, "I ate an apple.");
            }
            other => panic!("expected entry view, got a different lookup view: {other:?}"),
        },
        _ => panic!("expected main screen"),
    });
}

#[test]
fn failed_lookup_shows_request_failed() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut().type_str("zzz");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_100, UP);
    let _ = app.take_command();

    app.apply_lookup_result(DictionaryResult::failure());

    app.with_screen(3_200, |screen| match screen {
        Screen::Main { lookup, .. } => {
            assert_eq!(
                lookup,
                LookupView::Failed {
                    message: "Request failed"
                }
            );
        }
        _ => panic!("expected main screen"),
    });
}

#[test]
fn audio_keys_replay_the_current_entry() {
    let mut app = make_app();
    boot_to_main(&mut app);

    // No lookup yet: audio keys do nothing.
    app.input_mut()
        .push_key(Key::Function(FunctionKey::ReadWord));
    let _ = app.tick(3_100, UP);
    assert!(app.take_command().is_none());

    app.input_mut().type_str("apple");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_200, UP);
    let _ = app.take_command();
    app.apply_lookup_result(parse_result(
        r#"{"word":"apple","explanation":"a fruit","sample":"null"}"#,
    ));

    app.input_mut()
        .push_key(Key::Function(FunctionKey::ReadExplanation));
    let _ = app.tick(3_300, UP);
    match app.take_command() {
        Some(Command::PlayAudio { word, kind }) => {
            assert_eq!(word, "apple");
            assert_eq!(kind, crate::dictionary::AudioKind::Explanation);
        }
        other => panic!("expected audio command, got {other:?}"),
    }

    // The sample sentence was scrubbed to empty, so F4 is a no-op.
    app.input_mut()
        .push_key(Key::Function(FunctionKey::ReadSampleSentence));
    let _ = app.tick(3_400, UP);
    assert!(app.take_command().is_none());
}

#[test]
fn volume_keys_step_clamp_and_emit_commands() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut()
        .push_key(Key::Function(FunctionKey::VolumeUp));
    let _ = app.tick(3_100, UP);
    assert_eq!(app.volume_pct(), 80);
    assert_eq!(app.take_command(), Some(Command::SetVolume(80)));

    // Clamp at 100: the third press changes nothing and emits nothing.
    for t in [3_200u64, 3_300, 3_400] {
        app.input_mut()
            .push_key(Key::Function(FunctionKey::VolumeUp));
        let _ = app.tick(t, UP);
    }
    assert_eq!(app.volume_pct(), 100);
    assert_eq!(app.take_command(), Some(Command::SetVolume(90)));
    assert_eq!(app.take_command(), Some(Command::SetVolume(100)));
    assert!(app.take_command().is_none());
}

#[test]
fn manual_wifi_settings_visit_does_not_auto_return() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut()
        .push_key(Key::Function(FunctionKey::WifiSettings));
    let _ = app.tick(3_100, UP);
    assert_eq!(app.state(), AppState::WifiSettings);

    // WiFi is healthy the whole time, but this was a manual visit.
    let _ = app.tick(6_000, UP);
    let _ = app.tick(9_000, UP);
    assert_eq!(app.state(), AppState::WifiSettings);

    app.input_mut().push_key(Key::Function(FunctionKey::Escape));
    let _ = app.tick(9_100, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn credential_entry_submits_connect_and_auto_returns() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut()
        .push_key(Key::Function(FunctionKey::WifiSettings));
    let _ = app.tick(3_100, UP);
    assert_eq!(app.state(), AppState::WifiSettings);

    app.input_mut().type_str("homenet");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    app.input_mut().type_str("hunter2!");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    let _ = app.tick(3_200, UP);

    match app.take_command() {
        Some(Command::ConnectWifi(credentials)) => {
            assert_eq!(credentials.ssid, "homenet");
            assert_eq!(credentials.password, "hunter2!");
        }
        other => panic!("expected connect command, got {other:?}"),
    }
    assert_eq!(app.state(), AppState::WifiSettings);

    // Once the new network is up the screen returns on its own, unlike a
    // plain manual visit.
    let _ = app.tick(9_000, UP);
    assert_eq!(app.state(), AppState::Main);
}

#[test]
fn escape_abandons_credential_entry() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut()
        .push_key(Key::Function(FunctionKey::WifiSettings));
    let _ = app.tick(3_100, UP);

    app.input_mut().type_str("home");
    app.input_mut().push_key(Key::Function(FunctionKey::Escape));
    let _ = app.tick(3_200, UP);
    assert_eq!(app.state(), AppState::Main);
    assert!(app.take_command().is_none());

    // Characters typed on the settings screen never leak into the word entry.
    app.with_screen(3_300, |screen| match screen {
        Screen::Main { entry, .. } => assert_eq!(entry, ""),
        _ => panic!("expected main screen"),
    });
}

#[test]
fn password_entry_is_masked_in_the_view() {
    let mut app = make_app();
    boot_to_main(&mut app);

    app.input_mut()
        .push_key(Key::Function(FunctionKey::WifiSettings));
    let _ = app.tick(3_100, UP);

    app.input_mut().type_str("homenet");
    app.input_mut().push_key(Key::Function(FunctionKey::Enter));
    app.input_mut().type_str("secret");
    let _ = app.tick(3_200, UP);

    app.with_screen(3_300, |screen| match screen {
        Screen::WifiSettings { setup, .. } => {
            assert_eq!(
                setup,
                WifiSetupView::EnterPassword {
                    ssid: "homenet",
                    password_len: 6
                }
            );
        }
        _ => panic!("expected wifi settings screen"),
    });
}

#[test]
fn splash_requests_renders_as_progress_advances() {
    let mut app = make_app();
    let down = HealthSnapshot::default();
    assert_eq!(app.tick(0, down), TickResult::RenderRequested);

    // Within the same percent step nothing changes.
    assert_eq!(app.tick(50, down), TickResult::NoRender);
    assert_eq!(app.tick(100, down), TickResult::RenderRequested);
}

#[test]
fn typing_outside_main_is_ignored() {
    let mut app = make_app();
    let _ = app.tick(0, UP);
    assert_eq!(app.state(), AppState::Splash);

    app.input_mut().type_str("abc");
    let _ = app.tick(100, UP);

    boot_to_main(&mut app);
    app.with_screen(3_100, |screen| match screen {
        Screen::Main { entry, .. } => assert_eq!(entry, ""),
        _ => panic!("expected main screen"),
    });
}
