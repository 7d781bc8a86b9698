use teststand_common::{ChannelKind, DashboardConfig, RandomTelemetry, Reading, SampleMode};

#[test]
fn builtin_layout_runs_for_many_ticks() {
    let config = DashboardConfig::builtin().unwrap();
    let source = RandomTelemetry::seeded(2024, config.mode, config.servo_toggle_probability);
    let mut dashboard = config.build_dashboard(Box::new(source));

    for _ in 0..200 {
        dashboard.tick().unwrap();
    }

    assert_eq!(dashboard.ticks(), 200);
    assert_eq!(dashboard.title(), "Rocket Data & Stats");

    for state in dashboard.channels() {
        assert_eq!(state.history.len(), config.history_len);
        assert!(state.history.iter().all(|value| state.channel.range.contains(value)));

        match state.reading.unwrap() {
            Reading::Servo(_) => assert_eq!(state.channel.kind, ChannelKind::Servo),
            Reading::Scalar(value) => {
                assert_ne!(state.channel.kind, ChannelKind::Servo);
                assert!(state.channel.range.contains(value));
            }
        }
    }
}

#[test]
fn shared_dashboard_ticks_through_the_lock() {
    let config = DashboardConfig::from_json(
        r#"{
            "history_len": 4,
            "channels": [
                { "id": "pt1", "title": "Pressure 1", "kind": "pressure", "range": { "min": 0, "max": 70 } },
                { "id": "sv1", "title": "Vent", "kind": "servo" }
            ]
        }"#,
    )
    .unwrap();

    let source = RandomTelemetry::seeded(11, SampleMode::Uniform, 0.5);
    let dashboard = config.build_dashboard(Box::new(source)).shared();

    let handle = dashboard.clone();
    std::thread::spawn(move || {
        for _ in 0..10 {
            handle.lock().unwrap().tick().unwrap();
        }
    })
    .join()
    .unwrap();

    let dashboard = dashboard.lock().unwrap();
    assert_eq!(dashboard.ticks(), 10);
    assert_eq!(dashboard.channel("pt1").unwrap().history.len(), 4);
    assert_eq!(dashboard.channels_of(ChannelKind::Servo).count(), 1);

    let commands = dashboard.channel("pt1").unwrap().history.path_commands(dashboard.channel("pt1").unwrap().channel.range);
    assert_eq!(commands.matches('L').count(), 3);
}
