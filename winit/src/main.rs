// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::rc::Rc;

use slint::{ModelRc, SharedString, VecModel};
use teststand_common::{ChannelKind, ChannelState, Dashboard, DashboardConfig, DashboardSharedPointer, SampleMode};

/// The row models behind the four readout panels.
///
/// They are created once and refilled on every tick, so the UI keeps its bindings.
#[derive(Clone, Default)]
struct Panels {
    pressures: Rc<VecModel<ChannelRecord>>,
    temperatures: Rc<VecModel<ChannelRecord>>,
    loads: Rc<VecModel<ChannelRecord>>,
    servos: Rc<VecModel<ChannelRecord>>,
}

impl Panels {
    fn model(&self, kind: ChannelKind) -> &Rc<VecModel<ChannelRecord>> {
        match kind {
            ChannelKind::Pressure => &self.pressures,
            ChannelKind::Temperature => &self.temperatures,
            ChannelKind::Load => &self.loads,
            ChannelKind::Servo => &self.servos,
        }
    }

    /// Hand the models to the view model.
    fn bind(&self, model: &ViewModel) {
        model.set_pressures(ModelRc::from(self.pressures.clone()));
        model.set_temperatures(ModelRc::from(self.temperatures.clone()));
        model.set_loads(ModelRc::from(self.loads.clone()));
        model.set_servos(ModelRc::from(self.servos.clone()));
    }

    fn refresh(&self, dashboard: &Dashboard, decimals: usize) {
        for kind in ChannelKind::ALL {
            let records = dashboard
                .channels_of(kind)
                .map(|state| ChannelRecord::from_state(state, decimals))
                .collect::<Vec<_>>();
            self.model(kind).set_vec(records);
        }
    }
}

impl ChannelRecord {
    fn from_state(state: &ChannelState, decimals: usize) -> Self {
        Self {
            id: state.channel.id.as_str().into(),
            title: state.channel.title.as_str().into(),
            value_text: state.display(decimals).into(),
            fraction: state.fraction() as f32,
            open: state
                .reading
                .and_then(|reading| reading.servo_state())
                .is_some_and(|servo| servo.is_open()),
        }
    }
}

/// Our App struct that holds the UI, the dashboard state and the redraw timer.
///
/// Every tick of the timer asks the dashboard for new readings and pushes
/// them into the view model.
struct App {
    ui: AppWindow,
    dashboard: DashboardSharedPointer,
    timer: slint::Timer,
    panels: Panels,
    config: DashboardConfig,
}

impl App {
    /// Create a new App struct.
    ///
    /// Builds the dashboard from `config` and wires the view model callbacks.
    fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        let ui = AppWindow::new()?;

        let dashboard = config.build_dashboard(config.random_source()).shared();
        let panels = Panels::default();

        let model = ViewModel::get(&ui);
        model.set_title(config.title.as_str().into());
        panels.bind(&model);

        // The combo box lists every channel in config order.
        let chart_channels = config
            .channels
            .iter()
            .map(|channel| SharedString::from(channel.title.as_str()))
            .collect::<Vec<_>>();
        model.set_chart_channels(ModelRc::new(VecModel::from(chart_channels)));
        model.set_chart_index(0);

        let ui_handle = ui.as_weak();
        model.on_toggle_running(move || {
            let Some(ui) = ui_handle.upgrade() else {
                return;
            };
            let model = ViewModel::get(&ui);
            let running = !model.get_running();
            model.set_running(running);
            log::info!("Updates {}", if running { "resumed" } else { "paused" });
        });

        // Redraw the chart right away, so switching channels works while paused.
        let ui_handle = ui.as_weak();
        let chart_dashboard = dashboard.clone();
        let decimals = config.decimals;
        model.on_chart_selected(move |index| {
            let Some(ui) = ui_handle.upgrade() else {
                return;
            };
            match chart_dashboard.lock() {
                Ok(dashboard) => refresh_chart(&ViewModel::get(&ui), &dashboard, index, decimals),
                Err(e) => log::error!("Dashboard state is poisoned: {e}"),
            }
        });

        Ok(Self {
            ui,
            dashboard,
            timer: slint::Timer::default(),
            panels,
            config,
        })
    }

    /// Run the App: draw a first frame, start the timer and enter the event loop.
    fn run(&mut self) -> anyhow::Result<()> {
        let ui_handle = self.ui.as_weak();
        let dashboard = self.dashboard.clone();
        let panels = self.panels.clone();
        let decimals = self.config.decimals;

        let update = move || {
            let Some(ui) = ui_handle.upgrade() else {
                return;
            };
            let model = ViewModel::get(&ui);
            if !model.get_running() {
                return;
            }

            let mut dashboard = match dashboard.lock() {
                Ok(dashboard) => dashboard,
                Err(e) => {
                    log::error!("Dashboard state is poisoned: {e}");
                    return;
                }
            };

            if let Err(e) = dashboard.tick() {
                log::warn!("Skipping tick: {e}");
                return;
            }

            panels.refresh(&dashboard, decimals);
            refresh_chart(&model, &dashboard, model.get_chart_index(), decimals);

            model.set_tick_count(dashboard.ticks().min(i32::MAX as u64) as i32);
            model.set_last_update(chrono::Local::now().format("%H:%M:%S%.3f").to_string().into());
        };

        // Fill the panels before the window shows up.
        update();

        if let Ok(dashboard) = self.dashboard.lock() {
            log::info!(
                "Starting '{}' with {} channels, updating every {:?}",
                dashboard.title(),
                dashboard.channels().len(),
                self.config.tick_interval()
            );
        }
        ViewModel::get(&self.ui).set_source_name(self.source_label().into());

        self.timer
            .start(slint::TimerMode::Repeated, self.config.tick_interval(), update);

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }

    fn source_label(&self) -> String {
        match self.config.mode {
            SampleMode::Uniform => "random (uniform)".into(),
            SampleMode::Walk { step_fraction } => {
                format!("random walk ({:.0}% steps)", step_fraction * 100.0)
            }
        }
    }
}

/// Plot the history of the channel at `index` (in config order).
fn refresh_chart(model: &ViewModel, dashboard: &Dashboard, index: i32, decimals: usize) {
    let Some(state) = usize::try_from(index)
        .ok()
        .and_then(|index| dashboard.channels().get(index))
    else {
        return;
    };

    let channel = &state.channel;
    let range = channel.range;
    let unit = channel.unit();

    let title = match (state.history.min(), state.history.max()) {
        (Some(low), Some(high)) if !channel.kind.is_servo() => slint::format!(
            "{} [{}]  low {:.*} / high {:.*} {}",
            channel.title,
            channel.kind.label(),
            decimals,
            low,
            decimals,
            high,
            unit
        ),
        _ => slint::format!("{} [{}]", channel.title, channel.kind.label()),
    };
    model.set_chart_title(title);
    model.set_chart_commands(state.history.path_commands(range).into());

    if channel.kind.is_servo() {
        model.set_chart_max_label("OPEN".into());
        model.set_chart_min_label("CLOSED".into());
    } else {
        model.set_chart_max_label(slint::format!("{:.*} {}", decimals, range.max, unit));
        model.set_chart_min_label(slint::format!("{:.*} {}", decimals, range.min, unit));
    }
}

/// A minimal main function that loads the config, builds the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    log::debug!("Dashboard config: {config:?}");

    let mut app = App::new(config)?;

    app.run()
}
