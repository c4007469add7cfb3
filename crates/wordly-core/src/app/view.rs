impl<IN: InputProvider> DictionaryApp<IN> {
    pub fn with_screen<F>(&self, now_ms: u64, f: F)
    where
        F: FnOnce(Screen<'_>),
    {
        let status = self.status_bar();

        match self.state {
            AppState::Splash => {
                let elapsed = now_ms.saturating_sub(self.splash_start_ms.unwrap_or(now_ms));
                let progress_pct =
                    ((elapsed * 100) / self.policy.splash_timeout_ms.max(1)).min(100) as u8;
                f(Screen::Splash {
                    title: SPLASH_TITLE,
                    progress_pct,
                    status,
                });
            }
            AppState::Main => {
                let lookup = match &self.lookup {
                    LookupState::Idle => LookupView::Idle,
                    LookupState::Pending(word) => LookupView::Pending { word },
                    LookupState::Ready(result) => LookupView::Entry {
                        word: &result.word,
                        explanation: &result.explanation,
                        sample_sentence: &result.sample_sentence,
                    },
                    LookupState::Failed => LookupView::Failed {
                        message: MSG_REQUEST_FAILED,
                    },
                };
                f(Screen::Main {
                    entry: &self.entry,
                    lookup,
                    status,
                });
            }
            AppState::WifiSettings => {
                let connected = self.health.wifi == Some(true);
                let setup = match &self.wifi_setup {
                    WifiSetup::Idle => WifiSetupView::Status {
                        connecting: !connected,
                        message: if connected { "" } else { MSG_CONNECTION_FAILED },
                    },
                    WifiSetup::Ssid(ssid) => WifiSetupView::EnterSsid { ssid },
                    WifiSetup::Password { ssid, password } => WifiSetupView::EnterPassword {
                        ssid,
                        password_len: password.len(),
                    },
                };
                f(Screen::WifiSettings {
                    ssid: &self.wifi_ssid,
                    setup,
                    status,
                });
            }
            AppState::KeyboardSettings => {
                let connected = self.health.keyboard == Some(true);
                f(Screen::KeyboardSettings {
                    paired_addr: &self.keyboard_addr,
                    scanning: !connected,
                    message: if connected { "" } else { MSG_NO_DEVICES },
                    status,
                });
            }
        }
    }

    fn status_bar(&self) -> StatusBarView {
        StatusBarView {
            wifi: badge(self.health.wifi),
            keyboard: badge(self.health.keyboard),
            volume_pct: self.volume_pct,
        }
    }
}

fn badge(link: Option<bool>) -> LinkBadge {
    match link {
        None => LinkBadge::Unavailable,
        Some(false) => LinkBadge::Disconnected,
        Some(true) => LinkBadge::Connected,
    }
}
