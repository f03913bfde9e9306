//! ESP-AT modem radio
//!
//! Talks to an ESP8266/ESP32 running Espressif's AT firmware over a serial
//! link. Commands are CRLF-terminated lines; the modem answers with zero or
//! more information lines followed by `OK`, `ERROR` or `FAIL`.
//!
//! | query         | command                  | answer                           |
//! |---------------|--------------------------|----------------------------------|
//! | associated?   | `AT+CWJAP?`              | `+CWJAP:"ssid",...` or `No AP`   |
//! | associate     | `AT+CWJAP="ssid","pwd"`  | `WIFI CONNECTED`, `WIFI GOT IP`  |
//! | MAC address   | `AT+CIPSTAMAC?`          | `+CIPSTAMAC:"5c:cf:7f:01:02:03"` |
//! | IP address    | `AT+CIPSTA?`             | `+CIPSTA:ip:"192.168.0.42"`      |
//!
//! The modem also reports link changes on its own (`WIFI CONNECTED`,
//! `WIFI GOT IP`, `WIFI DISCONNECT`). The driver keeps the association
//! state, MAC and IP from those lines and from the answers it has seen, so
//! the [`Radio`] queries only drain what the link already holds. Waiting for
//! the modem happens in [`EspAtRadio::refresh`] and in `associate`, plus one
//! `AT+CIPSTA?` after the modem announces a new lease.

use core::str::{self, FromStr};

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};
use heapless::{String, Vec};
use wagner_core::traits::{IpAddress, MacAddress, Radio, RadioError};

/// Longest answer line kept; longer lines are dropped
pub const MAX_LINE_LEN: usize = 128;

/// Room for a join command with a fully escaped SSID and passphrase
const MAX_COMMAND_LEN: usize = 224;

/// Upper bound on buffered bytes drained in one go
const MAX_DRAIN_BYTES: usize = 512;

type Line = String<MAX_LINE_LEN>;

/// Modem timing
#[derive(Debug, Clone)]
pub struct EspAtConfig {
    /// Wait for the result of a query (ms)
    pub command_timeout_ms: u32,
    /// Wait for the result of a join (ms)
    pub join_timeout_ms: u32,
}

impl Default for EspAtConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 1000,
            join_timeout_ms: 20_000,
        }
    }
}

/// Radio backed by an ESP-AT modem
pub struct EspAtRadio<L, D> {
    link: L,
    delay: D,
    config: EspAtConfig,
    line: Vec<u8, MAX_LINE_LEN>,
    associated: bool,
    mac: Option<MacAddress>,
    /// Address of the current lease, `None` until queried
    ip: Option<IpAddress>,
}

impl<L, D> EspAtRadio<L, D>
where
    L: Read + Write + ReadReady,
    D: DelayNs,
{
    /// Create a driver that assumes the modem is not associated
    pub fn new(link: L, delay: D, config: EspAtConfig) -> Self {
        Self {
            link,
            delay,
            config,
            line: Vec::new(),
            associated: false,
            mac: None,
            ip: None,
        }
    }

    /// Check that the modem answers at all
    pub fn ping(&mut self) -> Result<(), RadioError> {
        self.command("AT", None, self.config.command_timeout_ms, RadioError::NotResponding)
            .map(|_| ())
    }

    /// Put the modem in station mode
    pub fn station_mode(&mut self) -> Result<(), RadioError> {
        self.command(
            "AT+CWMODE=1",
            None,
            self.config.command_timeout_ms,
            RadioError::NotResponding,
        )
        .map(|_| ())
    }

    /// Ask the modem for its association state and addresses
    ///
    /// Blocks for up to one query timeout per question. Call once at boot.
    pub fn refresh(&mut self) -> Result<(), RadioError> {
        let joined = self.command(
            "AT+CWJAP?",
            Some("+CWJAP:"),
            self.config.command_timeout_ms,
            RadioError::NotResponding,
        )?;
        self.associated = joined.is_some();
        self.mac = Some(self.query_mac()?);
        self.ip = if self.associated {
            Some(self.query_ip()?)
        } else {
            None
        };
        Ok(())
    }

    fn query_mac(&mut self) -> Result<MacAddress, RadioError> {
        let field = self
            .command(
                "AT+CIPSTAMAC?",
                Some("+CIPSTAMAC:"),
                self.config.command_timeout_ms,
                RadioError::NotResponding,
            )?
            .ok_or(RadioError::Malformed)?;
        parse_quoted(&field)
    }

    fn query_ip(&mut self) -> Result<IpAddress, RadioError> {
        let field = self
            .command(
                "AT+CIPSTA?",
                Some("+CIPSTA:ip:"),
                self.config.command_timeout_ms,
                RadioError::NotResponding,
            )?
            .ok_or(RadioError::Malformed)?;
        parse_quoted(&field)
    }

    /// Send a command and wait for its final result
    ///
    /// Returns the first answer line starting with `prefix`, prefix
    /// stripped. `ERROR`/`FAIL` map to `failure`.
    fn command(
        &mut self,
        command: &str,
        prefix: Option<&str>,
        timeout_ms: u32,
        failure: RadioError,
    ) -> Result<Option<Line>, RadioError> {
        // Leftovers may hold link reports; anything else is stale
        self.drain()?;
        self.line.clear();

        self.link
            .write_all(command.as_bytes())
            .and_then(|_| self.link.write_all(b"\r\n"))
            .and_then(|_| self.link.flush())
            .map_err(|_| RadioError::Link)?;

        let mut waited_ms = 0;
        let mut found = None;
        loop {
            let line = self.read_line(&mut waited_ms, timeout_ms)?;
            if self.note_report(&line) {
                continue;
            }
            match line.as_str() {
                "OK" => return Ok(found),
                "ERROR" | "FAIL" => return Err(failure),
                text if found.is_none() => {
                    if let Some(rest) = prefix.and_then(|p| text.strip_prefix(p)) {
                        found = Some(Line::try_from(rest).map_err(|_| RadioError::Malformed)?);
                    }
                }
                _ => {}
            }
        }
    }

    /// Read the next non-empty line
    fn read_line(&mut self, waited_ms: &mut u32, timeout_ms: u32) -> Result<Line, RadioError> {
        loop {
            match self.next_byte()? {
                Some(byte) => {
                    if let Some(line) = self.push_byte(byte) {
                        return Ok(line);
                    }
                }
                None => {
                    if *waited_ms >= timeout_ms {
                        return Err(RadioError::NotResponding);
                    }
                    self.delay.delay_ms(1);
                    *waited_ms += 1;
                }
            }
        }
    }

    /// Process whatever the link already holds, without waiting
    fn drain(&mut self) -> Result<(), RadioError> {
        for _ in 0..MAX_DRAIN_BYTES {
            let Some(byte) = self.next_byte()? else {
                break;
            };
            if let Some(line) = self.push_byte(byte) {
                self.note_report(&line);
            }
        }
        Ok(())
    }

    fn next_byte(&mut self) -> Result<Option<u8>, RadioError> {
        if !self.link.read_ready().map_err(|_| RadioError::Link)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.link.read(&mut byte).map_err(|_| RadioError::Link)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Add a byte to the line buffer, returning a completed line
    fn push_byte(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\n' => {
                let line = str::from_utf8(&self.line)
                    .ok()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .and_then(|l| Line::try_from(l).ok());
                self.line.clear();
                line
            }
            b'\r' => None,
            b => {
                if self.line.push(b).is_err() {
                    self.line.clear();
                }
                None
            }
        }
    }

    /// Track an unsolicited link report; returns whether `line` was one
    fn note_report(&mut self, line: &str) -> bool {
        match line {
            "WIFI CONNECTED" => self.associated = true,
            "WIFI GOT IP" => {
                self.associated = true;
                self.ip = None;
            }
            "WIFI DISCONNECT" => {
                self.associated = false;
                self.ip = None;
            }
            _ => return false,
        }
        true
    }
}

/// Append `"value"`, escaping the characters ESP-AT treats specially
fn push_quoted(out: &mut String<MAX_COMMAND_LEN>, value: &str) -> Result<(), RadioError> {
    out.push('"').map_err(|_| RadioError::Malformed)?;
    for c in value.chars() {
        if matches!(c, '"' | ',' | '\\') {
            out.push('\\').map_err(|_| RadioError::Malformed)?;
        }
        out.push(c).map_err(|_| RadioError::Malformed)?;
    }
    out.push('"').map_err(|_| RadioError::Malformed)
}

/// Parse a `"quoted"` answer field
fn parse_quoted<T: FromStr>(field: &str) -> Result<T, RadioError> {
    field
        .trim()
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .ok_or(RadioError::Malformed)?
        .parse()
        .map_err(|_| RadioError::Malformed)
}

impl<L, D> Radio for EspAtRadio<L, D>
where
    L: Read + Write + ReadReady,
    D: DelayNs,
{
    fn is_associated(&mut self) -> bool {
        self.drain().is_ok() && self.associated
    }

    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        let mut command = String::<MAX_COMMAND_LEN>::new();
        command
            .push_str("AT+CWJAP=")
            .map_err(|_| RadioError::Malformed)?;
        push_quoted(&mut command, ssid)?;
        command.push(',').map_err(|_| RadioError::Malformed)?;
        push_quoted(&mut command, password)?;

        let joined = self.command(
            &command,
            None,
            self.config.join_timeout_ms,
            RadioError::AssociationFailed,
        );
        if let Err(e) = joined {
            self.associated = false;
            self.ip = None;
            return Err(e);
        }

        self.associated = true;
        self.ip = self.query_ip().ok();
        if self.mac.is_none() {
            self.mac = self.query_mac().ok();
        }
        Ok(())
    }

    fn mac_address(&mut self) -> Result<MacAddress, RadioError> {
        self.mac.ok_or(RadioError::NotResponding)
    }

    fn local_ip(&mut self) -> Result<IpAddress, RadioError> {
        self.drain()?;
        if !self.associated {
            return Ok(IpAddress::UNSPECIFIED);
        }
        if let Some(ip) = self.ip {
            return Ok(ip);
        }
        // The modem just announced a lease, so it is awake to answer
        let ip = self.query_ip()?;
        self.ip = Some(ip);
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::collections::VecDeque;

    /// Serial link that plays back one scripted answer per command line
    #[derive(Default)]
    struct MockLink {
        tx: std::vec::Vec<u8>,
        rx: VecDeque<u8>,
        replies: VecDeque<&'static str>,
    }

    impl MockLink {
        fn replying(replies: &[&'static str]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn sent(&self) -> &str {
            str::from_utf8(&self.tx).unwrap()
        }

        /// Bytes the modem sends without being asked
        fn unsolicited(&mut self, text: &str) {
            self.rx.extend(text.bytes());
        }
    }

    impl embedded_io::ErrorType for MockLink {
        type Error = Infallible;
    }

    impl Read for MockLink {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for MockLink {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for MockLink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.tx.extend_from_slice(buf);
            if buf.ends_with(b"\n") {
                if let Some(reply) = self.replies.pop_front() {
                    self.rx.extend(reply.bytes());
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        total_ms: u32,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }
    }

    const JOINED: &str = "+CWJAP:\"home\",\"aa:bb:cc:dd:ee:ff\",6,-52\r\n\r\nOK\r\n";
    const NOT_JOINED: &str = "No AP\r\n\r\nOK\r\n";
    const MAC: &str = "+CIPSTAMAC:\"5c:cf:7f:01:02:03\"\r\n\r\nOK\r\n";
    const IP: &str = concat!(
        "+CIPSTA:ip:\"192.168.0.42\"\r\n",
        "+CIPSTA:gateway:\"192.168.0.1\"\r\n",
        "+CIPSTA:netmask:\"255.255.255.0\"\r\n",
        "\r\nOK\r\n"
    );

    fn radio(replies: &[&'static str]) -> EspAtRadio<MockLink, MockDelay> {
        EspAtRadio::new(
            MockLink::replying(replies),
            MockDelay::default(),
            EspAtConfig::default(),
        )
    }

    #[test]
    fn test_ping() {
        let mut r = radio(&["AT\r\n\r\nOK\r\n"]);
        assert_eq!(r.ping(), Ok(()));
        assert_eq!(r.link.sent(), "AT\r\n");
    }

    #[test]
    fn test_refresh_associated() {
        let mut r = radio(&[JOINED, MAC, IP]);
        assert_eq!(r.refresh(), Ok(()));
        assert_eq!(r.link.sent(), "AT+CWJAP?\r\nAT+CIPSTAMAC?\r\nAT+CIPSTA?\r\n");

        assert!(r.is_associated());
        assert_eq!(
            r.mac_address(),
            Ok(MacAddress([0x5c, 0xcf, 0x7f, 0x01, 0x02, 0x03]))
        );
        assert_eq!(r.local_ip(), Ok(IpAddress([192, 168, 0, 42])));
    }

    #[test]
    fn test_refresh_not_associated() {
        let mut r = radio(&[NOT_JOINED, MAC]);
        assert_eq!(r.refresh(), Ok(()));
        assert!(!r.is_associated());
        assert!(r.local_ip().unwrap().is_unspecified());
        assert_eq!(r.link.sent(), "AT+CWJAP?\r\nAT+CIPSTAMAC?\r\n");
    }

    #[test]
    fn test_queries_never_wait_for_the_modem() {
        // Nothing scripted: a query sent now would time out
        let mut r = radio(&[]);
        assert!(!r.is_associated());
        assert_eq!(r.mac_address(), Err(RadioError::NotResponding));
        assert!(r.local_ip().unwrap().is_unspecified());
        assert_eq!(r.delay.total_ms, 0);
        assert_eq!(r.link.sent(), "");
    }

    #[test]
    fn test_link_reports_update_state() {
        let mut r = radio(&[JOINED, MAC, IP, IP]);
        r.refresh().unwrap();

        r.link.unsolicited("WIFI DISCONNECT\r\n");
        assert!(!r.is_associated());
        assert!(r.local_ip().unwrap().is_unspecified());

        // Modem rejoined by itself: one address query for the new lease
        r.link.unsolicited("WIFI CONNECTED\r\nWIFI GOT IP\r\n");
        assert!(r.is_associated());
        assert_eq!(r.local_ip(), Ok(IpAddress([192, 168, 0, 42])));
        assert_eq!(r.local_ip(), Ok(IpAddress([192, 168, 0, 42])));
        assert!(r.link.sent().ends_with("AT+CIPSTA?\r\nAT+CIPSTA?\r\n"));
        assert_eq!(r.link.sent().matches("AT+CIPSTA?").count(), 2);
    }

    #[test]
    fn test_associate_escapes_credentials() {
        let mut r = radio(&["WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n", IP, MAC]);
        assert_eq!(r.associate("my,net", "pa\"ss\\"), Ok(()));
        assert!(r
            .link
            .sent()
            .starts_with("AT+CWJAP=\"my\\,net\",\"pa\\\"ss\\\\\"\r\n"));
        assert!(r.is_associated());
        assert_eq!(r.local_ip(), Ok(IpAddress([192, 168, 0, 42])));
        assert!(r.mac_address().is_ok());
    }

    #[test]
    fn test_associate_failure() {
        let mut r = radio(&["+CWJAP:1\r\n\r\nFAIL\r\n"]);
        assert_eq!(r.associate("home", "wrong"), Err(RadioError::AssociationFailed));
        assert!(!r.is_associated());

        let mut r = radio(&["ERROR\r\n"]);
        assert_eq!(r.associate("home", "wrong"), Err(RadioError::AssociationFailed));
    }

    #[test]
    fn test_malformed_answer() {
        let mut r = radio(&[NOT_JOINED, "+CIPSTAMAC:5c:cf\r\n\r\nOK\r\n"]);
        assert_eq!(r.refresh(), Err(RadioError::Malformed));

        let mut r = radio(&[JOINED, MAC, "OK\r\n"]);
        assert_eq!(r.refresh(), Err(RadioError::Malformed));
    }

    #[test]
    fn test_silent_modem_times_out() {
        let mut r = radio(&[]);
        assert_eq!(r.refresh(), Err(RadioError::NotResponding));
        assert_eq!(r.delay.total_ms, 1000);
        assert!(!r.is_associated());
    }

    #[test]
    fn test_stale_input_is_discarded() {
        let mut r = radio(&[NOT_JOINED, "+CIPSTAMAC:\"02:00:00:00:00:01\"\r\nOK\r\n"]);
        r.link.unsolicited("busy p...\r\nOK\r\n");
        assert_eq!(r.refresh(), Ok(()));
        assert_eq!(r.mac_address(), Ok(MacAddress([2, 0, 0, 0, 0, 1])));
    }
}
