// SomnoWatch — Flash Storage Glue
//
// SPIFFS mount (backs the log store's std::fs path) and the NVS
// key-value store holding the last-sync day stamp.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use crate::config::NVS_NAMESPACE;
use crate::error::{Fault, Result};
use crate::hal::NonVolatileStore;

/// Mount the SPIFFS partition at `/spiffs`, formatting it on first use.
/// Failure here is an InitFailure: the wake aborts, but main still arms
/// the sleep timer.
pub fn mount_spiffs() -> Result<()> {
    let conf = esp_idf_sys::esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };

    // Already-registered is fine: a previous wake's state never survives
    // deep sleep, but ESP-IDF keeps the VFS across soft resets.
    let ret = unsafe { esp_idf_sys::esp_vfs_spiffs_register(&conf) };
    if ret == esp_idf_sys::ESP_OK || ret == esp_idf_sys::ESP_ERR_INVALID_STATE {
        Ok(())
    } else {
        Err(Fault::Init(format!("spiffs mount failed ({ret})")))
    }
}

pub struct EspKvStore {
    nvs: EspNvs<NvsDefault>,
}

impl EspKvStore {
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)
            .map_err(|e| Fault::Init(format!("nvs namespace open failed: {e}")))?;
        Ok(Self { nvs })
    }
}

impl NonVolatileStore for EspKvStore {
    fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        self.nvs
            .get_u32(key)
            .map_err(|e| Fault::Io(std::io::Error::other(e)))
    }

    fn set_u32(&mut self, key: &str, value: u32) -> Result<()> {
        self.nvs
            .set_u32(key, value)
            .map_err(|e| Fault::Io(std::io::Error::other(e)))
    }
}
