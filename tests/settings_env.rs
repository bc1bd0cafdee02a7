//! Environment overrides for settings.
//!
//! Kept in its own test binary: it mutates the process environment.

use std::fs;

use tempfile::TempDir;
use warplink::Settings;

#[test]
fn environment_overrides_file_values() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("agent.toml");
    fs::write(
        &path,
        r#"
host = "agent-1"
server_address = "collector.example.net:7443"
cert_path = "/etc/warplink/client.pem"
private_key_path = "/etc/warplink/client.key"
ca_cert_path = "/etc/warplink/ca.pem"
"#,
    )
    .expect("write config");

    // SAFETY: this is the only test in this binary, so no other thread reads
    // the environment concurrently.
    unsafe {
        std::env::set_var("WARPLINK_SERVER_ADDRESS", "override.example.net:9443");
        std::env::set_var("WARPLINK_QUEUE_CAPACITY", "8");
    }
    let settings = Settings::from_file(&path).expect("load");

    assert_eq!(settings.server_address, "override.example.net:9443");
    assert_eq!(settings.queue_capacity, 8);
    assert_eq!(settings.host, "agent-1");
}
