//! Built-in provider drivers.

use core_drive::DriverRegistry;

/// Registry holding every bundled provider type.
pub fn builtin_drivers() -> DriverRegistry {
    DriverRegistry::builder()
        .register(provider_pan123::DRIVER_NAME, provider_pan123::Pan123Driver::factory)
        .register(
            provider_cloud189::DRIVER_NAME,
            provider_cloud189::Cloud189Driver::factory,
        )
        .register(
            provider_alidrive::DRIVER_NAME,
            provider_alidrive::AliDriveDriver::factory,
        )
        .register(
            provider_google_drive::DRIVER_NAME,
            provider_google_drive::GoogleDriveDriver::factory,
        )
        .register(
            provider_onedrive::DRIVER_NAME,
            provider_onedrive::OneDriveDriver::factory,
        )
        .build()
}
