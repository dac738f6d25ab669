// SomnoWatch — Wi-Fi, Provisioning, SNTP & Collector Sink
//
// Implements the Connectivity capability: one-time clock bootstrap
// (stored credential → provisioning portal → SNTP) and the bounded
// reassociation used by the daily sync. Also the HTTP sink that posts
// drained batches to the collector.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use embedded_svc::http::client::Client;
use embedded_svc::http::Status;
use embedded_svc::io::Write;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::http::server::{Configuration as ServerConfiguration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};

use crate::clock::{Clock, SystemClock};
use crate::config::*;
use crate::error::{Fault, Result};
use crate::hal::Connectivity;
use crate::record::SampleRecord;
use crate::store::SampleSink;

const CRED_NAMESPACE: &str = "wifi_cred";
const KEY_SSID: &str = "ssid";
const KEY_PASS: &str = "pass";

const PORTAL_HTML: &str = "<html><body><h1>SomnoWatch setup</h1>\
<form action=\"/save\" method=\"get\">\
SSID: <input name=\"ssid\"><br>\
Password: <input name=\"pass\" type=\"password\"><br>\
<input type=\"submit\" value=\"Save\"></form></body></html>";

fn conn_err(e: EspError) -> Fault {
    Fault::Connectivity(e.to_string())
}

pub struct EspConnectivity {
    wifi: BlockingWifi<EspWifi<'static>>,
    creds: EspNvs<NvsDefault>,
}

impl EspConnectivity {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self> {
        let esp_wifi =
            EspWifi::new(modem, sys_loop.clone(), Some(nvs.clone())).map_err(conn_err)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop).map_err(conn_err)?;
        let creds = EspNvs::new(nvs, CRED_NAMESPACE, true)
            .map_err(|e| Fault::Init(format!("credential store open failed: {e}")))?;
        Ok(Self { wifi, creds })
    }

    fn load_credentials(&self) -> Option<(String, String)> {
        let mut ssid_buf = [0u8; 33];
        let mut pass_buf = [0u8; 65];
        let ssid = self
            .creds
            .get_str(KEY_SSID, &mut ssid_buf)
            .ok()
            .flatten()?
            .to_string();
        let pass = self
            .creds
            .get_str(KEY_PASS, &mut pass_buf)
            .ok()
            .flatten()
            .unwrap_or("")
            .to_string();
        Some((ssid, pass))
    }

    fn save_credentials(&mut self, ssid: &str, pass: &str) -> Result<()> {
        let save_err = |e: EspError| Fault::Connectivity(format!("credential save failed: {e}"));
        self.creds.set_str(KEY_SSID, ssid).map_err(save_err)?;
        self.creds.set_str(KEY_PASS, pass).map_err(save_err)?;
        Ok(())
    }

    fn connect_with(&mut self, ssid: &str, pass: &str) -> Result<()> {
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| Fault::Connectivity("ssid too long".into()))?,
            password: pass
                .try_into()
                .map_err(|_| Fault::Connectivity("password too long".into()))?,
            auth_method: if pass.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        self.wifi.set_configuration(&conf).map_err(conn_err)?;
        self.wifi.start().map_err(conn_err)?;
        self.wifi.connect().map_err(conn_err)?;
        self.wifi.wait_netif_up().map_err(conn_err)?;
        Ok(())
    }

    /// Advertise the open setup network and block until the user posts
    /// a credential or the provisioning window elapses.
    fn provision(&mut self) -> Result<()> {
        let ap = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: PROVISION_SSID
                .try_into()
                .map_err(|_| Fault::Connectivity("ap ssid too long".into()))?,
            auth_method: AuthMethod::None,
            ..Default::default()
        });
        self.wifi.set_configuration(&ap).map_err(conn_err)?;
        self.wifi.start().map_err(conn_err)?;
        log::info!("provisioning AP '{PROVISION_SSID}' up — waiting for credentials");

        let received: Arc<Mutex<Option<(String, String)>>> = Arc::new(Mutex::new(None));

        let mut server =
            EspHttpServer::new(&ServerConfiguration::default()).map_err(conn_err)?;
        server
            .fn_handler("/", Method::Get, |request| {
                request
                    .into_ok_response()?
                    .write_all(PORTAL_HTML.as_bytes())?;
                Ok::<(), EspIOError>(())
            })
            .map_err(conn_err)?;

        let submitted = Arc::clone(&received);
        server
            .fn_handler("/save", Method::Get, move |request| {
                if let Some(creds) = parse_credentials(request.uri()) {
                    *submitted.lock().unwrap() = Some(creds);
                }
                request
                    .into_ok_response()?
                    .write_all(b"Saved. The watch will connect shortly.")?;
                Ok::<(), EspIOError>(())
            })
            .map_err(conn_err)?;

        let deadline = Instant::now() + Duration::from_secs(PROVISION_TIMEOUT_S);
        let (ssid, pass) = loop {
            if let Some(creds) = received.lock().unwrap().take() {
                break creds;
            }
            if Instant::now() > deadline {
                return Err(Fault::Connectivity("provisioning window elapsed".into()));
            }
            thread::sleep(Duration::from_millis(250));
        };
        drop(server);

        log::info!("credential received for '{ssid}'");
        self.save_credentials(&ssid, &pass)?;
        self.wifi.stop().map_err(conn_err)?;
        Ok(())
    }

    /// Query SNTP and wait (bounded) for the system clock to be set.
    fn sync_clock(&mut self) -> Result<()> {
        let sntp = EspSntp::new_default().map_err(conn_err)?;
        let deadline = Instant::now() + Duration::from_secs(SNTP_TIMEOUT_S);
        while sntp.get_sync_status() != SyncStatus::Completed {
            if Instant::now() > deadline {
                return Err(Fault::Connectivity("sntp sync timed out".into()));
            }
            thread::sleep(Duration::from_millis(250));
        }
        log::info!("clock set from network time");
        Ok(())
    }
}

impl Connectivity for EspConnectivity {
    fn bootstrap_clock(&mut self) -> Result<()> {
        if SystemClock.is_set() {
            return Ok(());
        }

        if !self.try_connect() {
            self.provision()?;
            if !self.try_connect() {
                return Err(Fault::Connectivity(
                    "provisioned credential did not associate".into(),
                ));
            }
        }

        // Radio off whatever the time service said.
        let result = self.sync_clock();
        self.disconnect();
        result
    }

    fn try_connect(&mut self) -> bool {
        let Some((ssid, pass)) = self.load_credentials() else {
            log::info!("no stored credential");
            return false;
        };
        match self.connect_with(&ssid, &pass) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("association with '{ssid}' failed: {e}");
                false
            }
        }
    }

    fn disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }
}

/// Pull `ssid`/`pass` out of the portal's `/save?ssid=..&pass=..` URI.
fn parse_credentials(uri: &str) -> Option<(String, String)> {
    let query = uri.split_once('?')?.1;
    let mut ssid = None;
    let mut pass = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some((KEY_SSID, v)) => ssid = Some(url_decode(v)),
            Some((KEY_PASS, v)) => pass = Some(url_decode(v)),
            _ => {}
        }
    }
    let ssid = ssid.filter(|s| !s.is_empty())?;
    Some((ssid, pass.unwrap_or_default()))
}

fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ---------------------------------------------------------------------------
// Collector sink
// ---------------------------------------------------------------------------

/// Posts the whole drained batch as one `text/csv` request. A single
/// request per batch means there is no partial-success state: anything
/// but a 2xx leaves the store for the next eligible wake.
pub struct HttpSink {
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl SampleSink for HttpSink {
    fn deliver(&mut self, batch: &[SampleRecord]) -> Result<()> {
        let delivery_err = |e: EspIOError| Fault::Delivery(e.to_string());

        let body = batch
            .iter()
            .map(|r| r.to_line())
            .collect::<Vec<_>>()
            .join("\n");

        let conn = EspHttpConnection::new(&HttpConfiguration::default())
            .map_err(|e| Fault::Delivery(e.to_string()))?;
        let mut client = Client::wrap(conn);

        let len = body.len().to_string();
        let headers = [("content-type", "text/csv"), ("content-length", len.as_str())];

        let mut request = client.post(&self.url, &headers).map_err(delivery_err)?;
        request.write_all(body.as_bytes()).map_err(delivery_err)?;
        let response = request.submit().map_err(delivery_err)?;

        let status = response.status();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(Fault::Delivery(format!("collector returned {status}")))
        }
    }
}
