//! End-to-end runs of the virtual rig through the host.

use xrtether::backends::virtual_input::{VirtualDeviceSpec, VirtualRig, VirtualRigHandle};
use xrtether::binding::BindingProfile;
use xrtether::{
    usage, DeviceId, DeviceRole, FeatureIndex, FeatureType, InputEvent, InputEventType,
    LifecycleState, Manager, Quaternion, Status, SubsystemHandle, UpdateType, Vector2, Vector3,
};

const HMD: DeviceId = DeviceId(0);
const LEFT: DeviceId = DeviceId(1);
const RIGHT: DeviceId = DeviceId(2);

fn started(rig: VirtualRig) -> (Manager, SubsystemHandle) {
    let mut mgr = Manager::new();
    let sub = mgr.register_lifecycle_provider("virtual", "input", rig).unwrap();
    mgr.initialize(sub).unwrap();
    mgr.start(sub).unwrap();
    mgr.update(UpdateType::Dynamic);
    (mgr, sub)
}

fn standard() -> (Manager, SubsystemHandle, VirtualRigHandle) {
    let (rig, handle) = VirtualRig::standard();
    let (mgr, sub) = started(rig);
    (mgr, sub, handle)
}

#[test]
fn primary_button_round_trip() {
    let spec = VirtualDeviceSpec::new(DeviceId(3), "Button Box", DeviceRole::Generic).feature(
        "PrimaryButton",
        FeatureType::Binary,
        &[usage::PRIMARY_BUTTON],
    );
    let (rig, handle) = VirtualRig::new(vec![spec]);
    let (mut mgr, sub) = started(rig);

    let def = mgr.definition(sub, DeviceId(3)).unwrap();
    assert_eq!(def.find_feature("PrimaryButton"), Some(FeatureIndex(0)));
    assert_eq!(def.find_usage(usage::PRIMARY_BUTTON), Some(FeatureIndex(0)));
    assert_eq!(mgr.state(sub, DeviceId(3)).unwrap().binary(FeatureIndex(0)), Some(false));

    handle.press(DeviceId(3), "PrimaryButton").unwrap();
    mgr.update(UpdateType::Dynamic);
    assert_eq!(mgr.state(sub, DeviceId(3)).unwrap().binary(FeatureIndex(0)), Some(true));
}

#[test]
fn standard_rig_connects_three_devices_with_roles() {
    let (mgr, sub, handle) = standard();
    assert_eq!(mgr.devices(sub).unwrap(), [HMD, LEFT, RIGHT]);
    assert_eq!(handle.connected(), [HMD, LEFT, RIGHT]);

    let snap = mgr.snapshot(sub).unwrap();
    assert_eq!(snap.find_by_role(DeviceRole::LeftHanded).count(), 1);
    assert_eq!(snap.find_by_role(DeviceRole::RightHanded).count(), 1);

    let hmd = snap.get(HMD).unwrap();
    let tracked = hmd.definition.find_usage(usage::IS_TRACKED).unwrap();
    assert_eq!(hmd.state.binary(tracked), Some(true));
    let ts = hmd.definition.find_usage(usage::TRACKING_STATE).unwrap();
    let ts = hmd.state.tracking_state(ts).unwrap();
    assert!(ts.contains(xrtether::TrackingState::POSITION | xrtether::TrackingState::ROTATION));
    assert_eq!(handle.frame_count(), 1);
}

#[test]
fn before_render_updates_only_pose() {
    let (mut mgr, sub, handle) = standard();
    let position = Vector3::new(0.1, 1.6, -0.2);
    let rotation = Quaternion::new(0.0, 0.7071, 0.0, 0.7071);
    handle.set_pose(RIGHT, position, rotation).unwrap();
    handle.set_axis(RIGHT, "Trigger", 0.9).unwrap();

    mgr.update(UpdateType::BeforeRender);
    let def = mgr.definition(sub, RIGHT).unwrap();
    let pos = def.find_usage(usage::DEVICE_POSITION).unwrap();
    let rot = def.find_usage(usage::DEVICE_ROTATION).unwrap();
    let trigger = def.find_usage(usage::TRIGGER).unwrap();
    let state = mgr.state(sub, RIGHT).unwrap();
    assert_eq!(state.axis3d(pos), Some(position));
    assert_eq!(state.rotation(rot), Some(rotation));
    assert_eq!(state.axis1d(trigger), Some(0.0));
    // Before-render polls do not start a new input frame.
    assert_eq!(handle.frame_count(), 1);

    mgr.update(UpdateType::Dynamic);
    assert_eq!(mgr.state(sub, RIGHT).unwrap().axis1d(trigger), Some(0.9));
}

#[test]
fn unknown_event_tag_fails_without_side_effects() {
    let (mut mgr, sub, handle) = standard();
    handle.set_axis(LEFT, "Grip", 0.4).unwrap();
    mgr.update(UpdateType::Dynamic);
    let before = mgr.snapshot(sub).unwrap();

    let tag = u32::from_be_bytes(*b"XRZZ");
    let err = mgr.send_event(sub, tag, LEFT, &[1, 2, 3]).unwrap_err();
    assert_eq!(err.status(), Status::Failure);

    assert_eq!(mgr.snapshot(sub).unwrap(), before);
    assert_eq!(handle.recenter_count(), 0);
    assert_eq!(handle.last_rumble(LEFT), None);
}

#[test]
fn recenter_broadcast_zeroes_positions() {
    let (mut mgr, sub, handle) = standard();
    handle
        .set_pose(HMD, Vector3::new(0.0, 1.7, 0.3), Quaternion::IDENTITY)
        .unwrap();
    handle
        .set_pose(LEFT, Vector3::new(-0.2, 1.2, 0.1), Quaternion::IDENTITY)
        .unwrap();
    mgr.update(UpdateType::Dynamic);

    let tag = InputEventType::Recenter.tag();
    mgr.send_event(sub, tag, DeviceId::INVALID, &[]).unwrap();
    assert_eq!(handle.recenter_count(), 1);
    mgr.update(UpdateType::BeforeRender);

    let snap = mgr.snapshot(sub).unwrap();
    for (_, dev) in snap.iter() {
        let pos = dev.definition.find_usage(usage::DEVICE_POSITION).unwrap();
        assert_eq!(dev.state.axis3d(pos), Some(Vector3::ZERO));
    }
}

#[test]
fn rumble_reaches_only_the_addressed_device() {
    let (mut mgr, sub, handle) = standard();
    let (tag, payload) = InputEvent::SimpleRumble {
        amplitude: 0.6,
        duration: 0.2,
    }
    .encode();
    mgr.send_event(sub, tag, RIGHT, &payload).unwrap();
    assert_eq!(handle.last_rumble(RIGHT), Some((0.6, 0.2)));
    assert_eq!(handle.last_rumble(LEFT), None);

    let mut loud = payload.clone();
    loud[..4].copy_from_slice(&2.0f32.to_le_bytes());
    let err = mgr.send_event(sub, tag, LEFT, &loud).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArguments);
    assert_eq!(handle.last_rumble(LEFT), None);

    let err = mgr.send_event(sub, tag, DeviceId(42), &payload).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArguments);
}

#[test]
fn events_require_a_started_subsystem() {
    let (mut mgr, sub, _handle) = standard();
    mgr.stop(sub).unwrap();
    assert!(mgr.devices(sub).unwrap().is_empty());
    let err = mgr
        .send_input_event(sub, DeviceId::INVALID, &InputEvent::Recenter)
        .unwrap_err();
    assert_eq!(err.status(), Status::Failure);

    mgr.start(sub).unwrap();
    mgr.update(UpdateType::Dynamic);
    assert_eq!(mgr.devices(sub).unwrap().len(), 3);
    mgr.shutdown(sub).unwrap();
    assert_eq!(mgr.lifecycle_state(sub).unwrap(), LifecycleState::Shutdown);
}

#[test]
fn hot_plug_through_handle() {
    let (mut mgr, sub, handle) = standard();
    handle.disconnect(LEFT);
    mgr.update(UpdateType::Dynamic);
    assert_eq!(mgr.devices(sub).unwrap(), [HMD, RIGHT]);

    handle.connect(LEFT).unwrap();
    mgr.update(UpdateType::Dynamic);
    assert_eq!(mgr.devices(sub).unwrap(), [HMD, LEFT, RIGHT]);
}

#[test]
fn bindings_resolve_against_rig_snapshot() {
    let (mut mgr, sub, handle) = standard();
    handle.set_axis(RIGHT, "Trigger", 0.5).unwrap();
    handle.press(LEFT, "Primary").unwrap();
    handle
        .set_value(
            LEFT,
            "Thumbstick",
            xrtether::FeatureValue::Axis2D(Vector2::new(0.0, 1.0)),
        )
        .unwrap();
    mgr.update(UpdateType::Dynamic);

    let profile = BindingProfile::from_toml_str(
        r#"
        name = "rig"

        [[bindings]]
        usage = "Trigger"
        role = "RightHanded"
        action = "fire"

        [[bindings]]
        usage = "PrimaryButton"
        role = "LeftHanded"
        action = "jump"

        [[bindings]]
        usage = "Primary2DAxis"
        role = "LeftHanded"
        action = "move"
        "#,
    )
    .unwrap();
    let out = profile.resolve(&mgr.snapshot(sub).unwrap());
    assert_eq!(out.axis("fire"), 0.5);
    assert!(out.button("jump"));
    assert_eq!(out.axis("move.y"), 1.0);
}

#[test]
fn snapshot_serializes_to_json() {
    let (mgr, sub, _handle) = standard();
    let json = mgr.snapshot(sub).unwrap().to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(json.contains("Virtual HMD"));
    assert!(value.is_object());
}
