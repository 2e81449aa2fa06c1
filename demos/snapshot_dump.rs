//! Usage: `snapshot_dump [host.toml] [rig.toml]`
//!
//! Runs one frame of a virtual rig and prints the snapshot as JSON.

use tracing_subscriber::EnvFilter;
use xrtether::backends::virtual_input::{VirtualRig, VirtualRigConfig};
use xrtether::{HostConfig, Manager, UpdateType};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => HostConfig::load(&path).expect("host config"),
        None => HostConfig::default(),
    };
    let (rig, _remote) = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path).expect("read rig config");
            VirtualRig::from_config(VirtualRigConfig::from_toml_str(&text).expect("rig config"))
        }
        None => VirtualRig::standard(),
    };

    let mut mgr = Manager::with_config(config);
    let sub = mgr
        .register_lifecycle_provider("virtual", "input", rig)
        .expect("register rig");
    mgr.initialize(sub).expect("initialize");
    mgr.start(sub).expect("start");
    mgr.update(UpdateType::Dynamic);

    let snapshot = mgr.snapshot(sub).expect("snapshot");
    println!("{}", snapshot.to_json_pretty().expect("serialize"));
}
