use wgpu::{Adapter, DeviceType, TextureFormat, TextureFormatFeatureFlags};

use crate::constants::SAMPLE_COUNTS;
use crate::error::StateError;
use crate::setting::GraphicSetting;

/// Higher is better. A device type the user asked for beats everything.
pub(crate) fn device_rank(device_type: DeviceType, preferred: Option<DeviceType>) -> u8 {
    if preferred == Some(device_type) {
        return u8::MAX;
    }
    match device_type {
        DeviceType::DiscreteGpu => 3,
        DeviceType::IntegratedGpu => 2,
        DeviceType::VirtualGpu => 1,
        DeviceType::Cpu | DeviceType::Other => 0,
    }
}

/// The requested count when supported, else the highest supported one, else 1.
pub(crate) fn pick_sample_count(requested: u32, supported: &[u32]) -> u32 {
    if supported.contains(&requested) {
        requested
    } else {
        supported.iter().copied().max().unwrap_or(1)
    }
}

pub(crate) fn supported_sample_counts(format: TextureFormat, adapter_flags: TextureFormatFeatureFlags) -> Vec<u32> {
    let format_flags = format.guaranteed_format_features(wgpu::Features::empty()).flags;
    SAMPLE_COUNTS.into_iter()
        .filter(|count| format_flags.sample_count_supported(*count) && adapter_flags.sample_count_supported(*count))
        .collect()
}

/// Explicit backend or device choices enumerate adapters and rank them,
/// otherwise wgpu picks a high performance one.
pub(crate) async fn select_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    setting: &GraphicSetting,
) -> Result<Adapter, StateError> {
    if setting.backends.is_some() || setting.device_type.is_some() {
        let ranked = instance.enumerate_adapters(setting.backends.unwrap_or(wgpu::Backends::all()))
            .into_iter()
            .filter(|adapter| adapter.is_surface_supported(surface))
            .max_by_key(|adapter| device_rank(adapter.get_info().device_type, setting.device_type));
        if let Some(adapter) = ranked {
            return Ok(adapter);
        }
        tracing::warn!(backends = ?setting.backends, device = ?setting.device_type, "requested adapter unavailable, falling back");
    }

    let options = wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(surface),
        force_fallback_adapter: false,
    };
    if let Some(adapter) = instance.request_adapter(&options).await {
        return Ok(adapter);
    }
    instance.enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .find(|adapter| adapter.is_surface_supported(surface))
        .ok_or(StateError::Adapter)
}

pub(crate) async fn open_device(adapter: &Adapter) -> Result<(wgpu::Device, wgpu::Queue), StateError> {
    let descriptor = wgpu::DeviceDescriptor {
        label: Some("viewer device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
        memory_hints: wgpu::MemoryHints::Performance,
    };
    Ok(adapter.request_device(&descriptor, None).await?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_device_wins() {
        let preferred = Some(DeviceType::IntegratedGpu);
        assert!(device_rank(DeviceType::IntegratedGpu, preferred) > device_rank(DeviceType::DiscreteGpu, preferred));
        assert!(device_rank(DeviceType::DiscreteGpu, None) > device_rank(DeviceType::Cpu, None));
    }

    #[test]
    fn sample_count_falls_back() {
        assert_eq!(pick_sample_count(4, &[1, 2, 4]), 4);
        assert_eq!(pick_sample_count(16, &[1, 4, 8]), 8);
        assert_eq!(pick_sample_count(8, &[]), 1);
    }
}
