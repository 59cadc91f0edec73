use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// The input device called `device_name`, or the host default.
pub fn get_or_default_input(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());
    let Some(target) = device_name else {
        return host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device"));
    };
    host.input_devices()
        .context("failed to list input devices")?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .ok_or_else(|| anyhow!("No input device named {}", target))
}

/// The output device called `device_name`, or the host default.
pub fn get_or_default_output(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    let Some(target) = device_name else {
        return host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default output device"));
    };
    host.output_devices()
        .context("failed to list output devices")?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .ok_or_else(|| anyhow!("No output device named {}", target))
}

pub fn get_available_inputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host.default_input_device().and_then(|d| d.name().ok());
    let mut device_names: Vec<String> = Vec::new();
    for in_device in host.input_devices().context("failed to list input devices")? {
        let d_name = in_device.name().unwrap_or_else(|_| "<unnamed>".to_string());
        let d_cfg = match in_device.default_input_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!("skipping {}: {}", d_name, e);
                continue;
            }
        };
        device_names.push(describe(&d_name, d_cfg.channels(), d_cfg.sample_rate().0, default_device.as_deref()));
    }
    Ok(device_names.join("\n"))
}

pub fn get_available_outputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host.default_output_device().and_then(|d| d.name().ok());
    let mut device_names: Vec<String> = Vec::new();
    for out_device in host.output_devices().context("failed to list output devices")? {
        let d_name = out_device.name().unwrap_or_else(|_| "<unnamed>".to_string());
        let d_cfg = match out_device.default_output_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!("skipping {}: {}", d_name, e);
                continue;
            }
        };
        device_names.push(describe(&d_name, d_cfg.channels(), d_cfg.sample_rate().0, default_device.as_deref()));
    }
    Ok(device_names.join("\n"))
}

fn describe(name: &str, channels: u16, sample_rate: u32, default_device: Option<&str>) -> String {
    let mut d = format!(" * {}({}ch, {}hz)", name, channels, sample_rate);
    if default_device == Some(name) {
        d.push_str(" [default]");
    }
    d
}
