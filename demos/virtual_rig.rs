use std::time::Duration;

use tracing_subscriber::EnvFilter;
use xrtether::backends::virtual_input::VirtualRig;
use xrtether::binding::BindingProfile;
use xrtether::filtered_listener::FilteredListener;
use xrtether::logger::TracingListener;
use xrtether::{
    DeviceId, EventFilter, HostEvent, InputEvent, Manager, Quaternion, UpdateType, Vector3,
};

const BINDINGS: &str = r#"
name = "demo"

[[bindings]]
usage = "Trigger"
role = "RightHanded"
action = "fire"

[[bindings]]
usage = "Primary2DAxis"
role = "LeftHanded"
action = "move"
deadzone = 0.05
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut mgr = Manager::new();
    mgr.add_listener(TracingListener::new(), EventFilter::All, None);
    // Only report controllers, not the headset.
    mgr.add_listener(
        FilteredListener::new(
            |e| matches!(e, HostEvent::DeviceConnected { device, .. } if device.0 != 0),
            Box::new(TracingListener::new()),
        ),
        EventFilter::TopologyOnly,
        None,
    );

    let (rig, remote) = VirtualRig::standard();
    let sub = mgr
        .register_lifecycle_provider("virtual", "input", rig)
        .expect("register rig");
    mgr.initialize(sub).expect("initialize");
    mgr.start(sub).expect("start");

    let profile = BindingProfile::from_toml_str(BINDINGS).expect("bindings");
    let right = DeviceId(2);

    for frame in 0..60u32 {
        let t = frame as f32 / 60.0;
        remote.set_axis(right, "Trigger", t).expect("trigger");
        remote
            .set_pose(
                DeviceId(0),
                Vector3::new(0.0, 1.7, -t * 0.1),
                Quaternion::IDENTITY,
            )
            .expect("pose");

        mgr.update(UpdateType::Dynamic);
        mgr.update(UpdateType::BeforeRender);

        if frame % 15 == 0 {
            let out = profile.resolve(&mgr.snapshot(sub).expect("snapshot"));
            println!("frame {frame:02}: fire={:.2}", out.axis("fire"));
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    mgr.send_input_event(
        sub,
        right,
        &InputEvent::SimpleRumble {
            amplitude: 0.8,
            duration: 0.1,
        },
    )
    .expect("rumble");
    println!("rumble on right controller: {:?}", remote.last_rumble(right));

    mgr.shutdown(sub).expect("shutdown");
}
