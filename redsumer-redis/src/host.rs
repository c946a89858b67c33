use mac_address::get_mac_address;
use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use redsumer_types::ConsumerId;

lazy_static::lazy_static! {
    static ref HOST_ID: String = init();
}

const LEN: usize = 12;

/// Used when the host cannot be identified.
pub const UNKNOWN_HOST: &str = "localhost";

fn init() -> String {
    if let Ok(host_id) = std::env::var("HOST_ID") {
        return host_id;
    }
    if let Some(container_id) = docker_container_id() {
        return container_id;
    }
    match get_mac_address() {
        Ok(Some(mac)) => {
            let mac = mac.to_string().replace(':', "");
            mac.get(..LEN).unwrap_or(&mac).to_owned()
        }
        Ok(None) => {
            log::warn!("There is no MAC address on this host");
            UNKNOWN_HOST.to_owned()
        }
        Err(err) => {
            log::warn!("Failed to get MAC address: {err}");
            UNKNOWN_HOST.to_owned()
        }
    }
}

fn docker_container_id() -> Option<String> {
    let file = File::open("/proc/self/cgroup").ok()?;
    let last = BufReader::new(file).lines().last()?.ok()?;
    let (_, remaining) = last.split_once("0::/docker/")?;
    if remaining.is_empty() {
        return None;
    }
    Some(remaining.get(..LEN).unwrap_or(remaining).to_owned())
}

/// Identifies this host. Can be overridden by the `HOST_ID` environment variable;
/// otherwise it is the docker container id, or derived from the MAC address.
pub fn host_id() -> &'static str {
    &HOST_ID
}

/// A consumer id unique to this process: `<host_id>-<pid>`.
pub fn default_consumer_id() -> ConsumerId {
    ConsumerId::new(format!("{}-{}", host_id(), std::process::id()))
}
