impl<IN: InputProvider> DictionaryApp<IN> {
    fn process_inputs(&mut self, now_ms: u64) {
        while let Ok(Some(event)) = self.input.poll_event() {
            self.handle_key(event.key, now_ms);
        }
    }

    fn handle_key(&mut self, key: Key, now_ms: u64) {
        match key {
            Key::Function(function) => self.handle_function_key(function, now_ms),
            Key::Char(ch) => match self.state {
                AppState::Main => {
                    if self.entry.push(ch).is_ok() {
                        self.pending_redraw = true;
                    }
                }
                AppState::WifiSettings => self.setup_push_char(ch),
                _ => {}
            },
        }
    }

    fn handle_function_key(&mut self, function: FunctionKey, now_ms: u64) {
        // Global keys first.
        match function {
            FunctionKey::VolumeUp => {
                return self.adjust_volume(VOLUME_STEP_PCT as i8);
            }
            FunctionKey::VolumeDown => {
                return self.adjust_volume(-(VOLUME_STEP_PCT as i8));
            }
            FunctionKey::MemoryStatus => {
                return self.push_command(Command::PrintMemoryStatus);
            }
            _ => {}
        }

        match self.state {
            AppState::Splash => {}
            AppState::Main => match function {
                FunctionKey::Enter => self.submit_entry(),
                FunctionKey::Backspace => {
                    if self.entry.pop().is_some() {
                        self.pending_redraw = true;
                    }
                }
                FunctionKey::ReadWord => self.request_audio(AudioKind::Word),
                FunctionKey::ReadExplanation => self.request_audio(AudioKind::Explanation),
                FunctionKey::ReadSampleSentence => self.request_audio(AudioKind::Sample),
                FunctionKey::WifiSettings => {
                    // Manual visit: no auto-return, but it still arms the
                    // recovery cooldown so health checks stay quiet after.
                    self.recovering_from = None;
                    self.last_recovery_ms = Some(now_ms);
                    self.set_state(AppState::WifiSettings);
                }
                _ => {}
            },
            AppState::WifiSettings => match function {
                FunctionKey::Enter => self.setup_advance(now_ms),
                FunctionKey::Backspace => self.setup_pop_char(),
                FunctionKey::Escape => {
                    self.wifi_setup = WifiSetup::Idle;
                    self.recovering_from = None;
                    self.set_state(AppState::Main);
                }
                _ => {}
            },
            AppState::KeyboardSettings => {
                if function == FunctionKey::Escape {
                    self.recovering_from = None;
                    self.set_state(AppState::Main);
                }
            }
        }
    }

    /// Typing on the WiFi settings screen edits the credential being entered;
    /// the first character starts a fresh SSID.
    fn setup_push_char(&mut self, ch: char) {
        let pushed = match &mut self.wifi_setup {
            WifiSetup::Idle => {
                let mut ssid = HeaplessString::new();
                let pushed = ssid.push(ch).is_ok();
                self.wifi_setup = WifiSetup::Ssid(ssid);
                pushed
            }
            WifiSetup::Ssid(ssid) => ssid.push(ch).is_ok(),
            WifiSetup::Password { password, .. } => password.push(ch).is_ok(),
        };
        if pushed {
            self.pending_redraw = true;
        }
    }

    fn setup_pop_char(&mut self) {
        let popped = match &mut self.wifi_setup {
            WifiSetup::Idle => None,
            WifiSetup::Ssid(ssid) => ssid.pop(),
            WifiSetup::Password { password, .. } => password.pop(),
        };
        if popped.is_some() {
            self.pending_redraw = true;
        }
    }

    /// Enter moves SSID entry into password entry, then submits both.
    /// Submission arms recovery tracking, so the screen returns to the main
    /// view on its own once the new network is up.
    fn setup_advance(&mut self, now_ms: u64) {
        match core::mem::replace(&mut self.wifi_setup, WifiSetup::Idle) {
            WifiSetup::Idle => {}
            WifiSetup::Ssid(ssid) => {
                if ssid.is_empty() {
                    return;
                }
                self.wifi_setup = WifiSetup::Password {
                    ssid,
                    password: HeaplessString::new(),
                };
                self.pending_redraw = true;
            }
            WifiSetup::Password { ssid, password } => {
                info!("connecting to \"{ssid}\"");
                self.wifi_ssid.clear();
                let _ = self.wifi_ssid.push_str(&ssid);
                self.recovering_from = Some(RecoveryService::Wifi);
                self.last_recovery_ms = Some(now_ms);
                self.push_command(Command::ConnectWifi(WifiCredentials { ssid, password }));
                self.pending_redraw = true;
            }
        }
    }

    fn submit_entry(&mut self) {
        if !is_word_valid(&self.entry) {
            return;
        }
        let word = self.entry.clone();
        self.lookup = LookupState::Pending(word.clone());
        self.push_command(Command::Lookup(word));
        self.pending_redraw = true;
    }

    /// Plays the last successful lookup; quietly ignored when the matching
    /// field is empty.
    fn request_audio(&mut self, kind: AudioKind) {
        let LookupState::Ready(result) = &self.lookup else {
            return;
        };
        let available = match kind {
            AudioKind::Word => !result.word.is_empty(),
            AudioKind::Explanation => !result.explanation.is_empty(),
            AudioKind::Sample => !result.sample_sentence.is_empty(),
        };
        if available {
            let word = result.word.clone();
            self.push_command(Command::PlayAudio { word, kind });
        }
    }

    fn adjust_volume(&mut self, delta_pct: i8) {
        let next = (self.volume_pct as i16 + delta_pct as i16).clamp(0, MAX_VOLUME_PCT as i16) as u8;
        if next != self.volume_pct {
            self.volume_pct = next;
            self.push_command(Command::SetVolume(next));
            self.pending_redraw = true;
        }
    }
}
