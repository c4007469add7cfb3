impl<IN: InputProvider> DictionaryApp<IN> {
    pub fn new(input: IN, policy: StatePolicy, volume_pct: u8) -> Self {
        Self {
            input,
            policy,
            state: AppState::Splash,
            splash_start_ms: None,
            last_splash_pct: 0,
            last_health_check_ms: None,
            last_recovery_ms: None,
            recovering_from: None,
            health: HealthSnapshot::default(),
            entry: HeaplessString::new(),
            lookup: LookupState::Idle,
            volume_pct: volume_pct.min(MAX_VOLUME_PCT),
            wifi_ssid: HeaplessString::new(),
            wifi_setup: WifiSetup::Idle,
            keyboard_addr: HeaplessString::new(),
            pending_redraw: true,
            commands: heapless::Deque::new(),
        }
    }

    /// Labels shown on the settings screens; both are display-only.
    pub fn set_network_labels(&mut self, ssid: &str, keyboard_addr: &str) {
        self.wifi_ssid.clear();
        let _ = self.wifi_ssid.push_str(ssid);
        self.keyboard_addr.clear();
        let _ = self.keyboard_addr.push_str(keyboard_addr);
        self.pending_redraw = true;
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn volume_pct(&self) -> u8 {
        self.volume_pct
    }

    pub fn input_mut(&mut self) -> &mut IN {
        &mut self.input
    }

    pub fn take_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Drives input, splash timing, and health-based transitions.
    pub fn tick(&mut self, now_ms: u64, health: HealthSnapshot) -> TickResult {
        if self.splash_start_ms.is_none() {
            self.splash_start_ms = Some(now_ms);
        }
        if self.health != health {
            self.health = health;
            self.pending_redraw = true;
        }

        self.process_inputs(now_ms);

        match self.state {
            AppState::Splash => self.tick_splash(now_ms),
            _ => self.tick_health(now_ms),
        }

        if self.pending_redraw {
            self.pending_redraw = false;
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    /// Delivered by the composition root when a lookup finishes.
    pub fn apply_lookup_result(&mut self, result: DictionaryResult) {
        if !matches!(self.lookup, LookupState::Pending(_)) {
            return;
        }
        self.lookup = if result.success {
            LookupState::Ready(result)
        } else {
            LookupState::Failed
        };
        self.pending_redraw = true;
    }

    fn tick_splash(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.splash_start_ms.unwrap_or(now_ms));

        let pct = ((elapsed * 100) / self.policy.splash_timeout_ms.max(1)).min(100) as u8;
        if pct != self.last_splash_pct {
            self.last_splash_pct = pct;
            self.pending_redraw = true;
        }

        let wifi_up = self.health.wifi == Some(true);
        let dwell_done = elapsed >= self.policy.splash_min_ms;
        let timed_out = elapsed >= self.policy.splash_timeout_ms;

        if (dwell_done && wifi_up) || timed_out {
            let target = if wifi_up {
                AppState::Main
            } else {
                AppState::WifiSettings
            };
            info!("splash done after {elapsed}ms, wifi_up={wifi_up}");
            self.set_state(target);
        }
    }

    fn tick_health(&mut self, now_ms: u64) {
        let due = match self.last_health_check_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.policy.health_check_interval_ms,
            None => true,
        };
        if !due {
            return;
        }
        self.last_health_check_ms = Some(now_ms);

        match self.state {
            AppState::Main => {
                // Degraded services pull the UI into the matching settings
                // screen, rate-limited so a flapping link cannot bounce the
                // user around.
                let service = if self.health.wifi == Some(false) {
                    Some(RecoveryService::Wifi)
                } else if self.health.keyboard == Some(false) {
                    Some(RecoveryService::Keyboard)
                } else {
                    None
                };

                if let Some(service) = service {
                    if self.recovery_cooldown_elapsed(now_ms) {
                        debug!("health recovery: {service:?} down");
                        self.recovering_from = Some(service);
                        self.last_recovery_ms = Some(now_ms);
                        self.set_state(match service {
                            RecoveryService::Wifi => AppState::WifiSettings,
                            RecoveryService::Keyboard => AppState::KeyboardSettings,
                        });
                    }
                }
            }
            AppState::WifiSettings | AppState::KeyboardSettings => {
                // Automatic entries return to MAIN once the service is back;
                // user-initiated visits stay until dismissed.
                let recovered = match self.recovering_from {
                    Some(RecoveryService::Wifi) => self.health.wifi == Some(true),
                    Some(RecoveryService::Keyboard) => self.health.keyboard == Some(true),
                    None => false,
                };
                if recovered {
                    debug!("service recovered, returning to main");
                    self.recovering_from = None;
                    self.set_state(AppState::Main);
                }
            }
            AppState::Splash => {}
        }
    }

    fn recovery_cooldown_elapsed(&self, now_ms: u64) -> bool {
        match self.last_recovery_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.policy.recovery_cooldown_ms,
            None => true,
        }
    }

    /// Idempotent: re-entering the current state does not redraw.
    fn set_state(&mut self, state: AppState) {
        if self.state == state {
            return;
        }
        debug!("state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.pending_redraw = true;
    }

    fn push_command(&mut self, command: Command) {
        if self.commands.push_back(command).is_err() {
            debug!("command queue full, dropping");
        }
    }
}
