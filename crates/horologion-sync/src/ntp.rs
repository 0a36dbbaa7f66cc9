//! SNTP client (RFC 4330 subset)
//!
//! Unicast client mode only: build a 48-byte request, stamp the
//! transmit timestamp, and derive clock offset and round-trip delay
//! from the four-timestamp exchange.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, warn};

use horologion_core::{ClockOffset, HorologionError, HorologionResult, UtcInstant, WallClock};

/// NTP packet size without authentication
const NTP_PACKET_SIZE: usize = 48;

/// LI = 0, VN = 4, Mode = 3 (client)
const NTP_CLIENT_HEADER: u8 = 0x23;

/// Seconds between the NTP era (1900-01-01) and the Unix epoch
const NTP_UNIX_OFFSET_SECS: u64 = 2_208_988_800;

/// Public NTP pool servers tried in order
pub const NTP_SERVERS: &[&str] = &[
    "pool.ntp.org:123",
    "time.google.com:123",
    "time.cloudflare.com:123",
    "time.nist.gov:123",
];

/// Result of one successful SNTP exchange
#[derive(Debug, Clone)]
pub struct SyncSample {
    /// Server that answered
    pub server: String,

    /// Clock offset: server time minus local time
    pub offset: ClockOffset,

    /// Round-trip delay of the exchange
    pub round_trip: Duration,

    /// Server stratum (1 = primary reference)
    pub stratum: u8,

    /// Local instant the sample was taken
    pub measured_at: UtcInstant,
}

/// SNTP client
pub struct NtpClient {
    /// Timeout for one request/reply exchange
    timeout: Duration,

    /// Attempts per server before moving on
    retries: u32,
}

impl NtpClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            retries: 3,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 3,
        }
    }

    /// Query one server for a clock offset sample
    pub async fn query(&self, server: &str, clock: &dyn WallClock) -> HorologionResult<SyncSample> {
        let server_addr = resolve(server).await?;
        self.query_addr(server, server_addr, clock).await
    }

    async fn query_addr(
        &self,
        server: &str,
        server_addr: SocketAddr,
        clock: &dyn WallClock,
    ) -> HorologionResult<SyncSample> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| HorologionError::Transport(e.to_string()))?;
        socket
            .connect(server_addr)
            .await
            .map_err(|e| HorologionError::Transport(e.to_string()))?;

        for attempt in 0..self.retries {
            let t1 = clock.read();
            let transmit = randomize_fraction(unix_to_ntp(t1));
            let request = build_request(transmit);

            socket
                .send(&request)
                .await
                .map_err(|e| HorologionError::Transport(e.to_string()))?;

            let mut buf = [0u8; 128];
            match timeout(self.timeout, socket.recv(&mut buf)).await {
                Ok(Ok(len)) => {
                    let t4 = clock.read();
                    match parse_reply(&buf[..len], transmit) {
                        Some(reply) => {
                            return Ok(sample_from(server, &reply, t1, t4));
                        }
                        None => {
                            warn!(server, attempt, "discarding malformed SNTP reply");
                            if attempt == self.retries - 1 {
                                return Err(HorologionError::MalformedReply {
                                    server: server.to_string(),
                                });
                            }
                        }
                    }
                }
                Ok(Err(e)) => {
                    if attempt == self.retries - 1 {
                        return Err(HorologionError::Transport(e.to_string()));
                    }
                }
                Err(_) => {
                    debug!(server, attempt, "SNTP request timed out");
                    if attempt == self.retries - 1 {
                        return Err(HorologionError::SyncTimeout {
                            server: server.to_string(),
                        });
                    }
                }
            }
        }

        Err(HorologionError::SyncTimeout {
            server: server.to_string(),
        })
    }

    /// Try servers in order and return the first successful sample.
    /// An empty list yields `NoServerReachable`.
    pub async fn query_any(
        &self,
        servers: &[String],
        clock: &dyn WallClock,
    ) -> HorologionResult<SyncSample> {
        for server in servers {
            match self.query(server, clock).await {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    warn!(server, error = %e, "SNTP server failed, trying next");
                }
            }
        }
        Err(HorologionError::NoServerReachable)
    }
}

impl Default for NtpClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve(server: &str) -> HorologionResult<SocketAddr> {
    let mut addrs = lookup_host(server)
        .await
        .map_err(|e| HorologionError::DnsResolutionFailed {
            server: server.to_string(),
            reason: e.to_string(),
        })?;
    addrs
        .next()
        .ok_or_else(|| HorologionError::DnsResolutionFailed {
            server: server.to_string(),
            reason: "no addresses returned".to_string(),
        })
}

/// Fields of a validated server reply
struct ServerReply {
    stratum: u8,
    /// T2: server receive timestamp
    receive: UtcInstant,
    /// T3: server transmit timestamp
    transmit: UtcInstant,
}

fn sample_from(server: &str, reply: &ServerReply, t1: UtcInstant, t4: UtcInstant) -> SyncSample {
    // offset = ((T2 - T1) + (T3 - T4)) / 2, delay = (T4 - T1) - (T3 - T2)
    let t1 = t1.as_micros();
    let t4 = t4.as_micros();
    let t2 = reply.receive.as_micros();
    let t3 = reply.transmit.as_micros();

    let offset = ClockOffset::from_micros(((t2 - t1) + (t3 - t4)) / 2);
    let delay = ((t4 - t1) - (t3 - t2)).max(0);

    SyncSample {
        server: server.to_string(),
        offset,
        round_trip: Duration::from_micros(delay as u64),
        stratum: reply.stratum,
        measured_at: UtcInstant::from_micros(t4),
    }
}

/// Convert a Unix-epoch instant to the 32.32 NTP timestamp format
pub(crate) fn unix_to_ntp(instant: UtcInstant) -> u64 {
    let micros = instant.as_micros();
    let secs = micros.div_euclid(1_000_000) + NTP_UNIX_OFFSET_SECS as i64;
    let frac_micros = micros.rem_euclid(1_000_000) as u64;
    let frac = (frac_micros << 32) / 1_000_000;
    ((secs as u64) << 32) | frac
}

/// Convert a 32.32 NTP timestamp to a Unix-epoch instant
pub(crate) fn ntp_to_unix(ntp: u64) -> UtcInstant {
    let secs = (ntp >> 32) as i64 - NTP_UNIX_OFFSET_SECS as i64;
    let frac_micros = (((ntp & 0xFFFF_FFFF) * 1_000_000) >> 32) as i64;
    UtcInstant::from_micros(secs * 1_000_000 + frac_micros)
}

/// Randomize the sub-microsecond fraction bits of a transmit
/// timestamp, per RFC 4330's recommendation for the unused low bits
fn randomize_fraction(ntp: u64) -> u64 {
    ntp ^ u64::from(rand::random::<u16>())
}

/// Build a client request carrying `transmit` as the transmit
/// timestamp
fn build_request(transmit: u64) -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = NTP_CLIENT_HEADER;
    packet[40..48].copy_from_slice(&transmit.to_be_bytes());
    packet
}

/// Validate a server reply against the request's transmit timestamp
/// and extract its fields
fn parse_reply(data: &[u8], expected_originate: u64) -> Option<ServerReply> {
    if data.len() < NTP_PACKET_SIZE {
        return None;
    }

    // Mode must be server (4) or broadcast (5)
    let mode = data[0] & 0x07;
    if mode != 4 && mode != 5 {
        return None;
    }

    // Stratum 0 is a kiss-of-death, anything above 15 is unsynchronized
    let stratum = data[1];
    if stratum == 0 || stratum > 15 {
        return None;
    }

    // Originate timestamp must echo our transmit timestamp
    let originate = u64::from_be_bytes(data[24..32].try_into().ok()?);
    if originate != expected_originate {
        return None;
    }

    let receive = u64::from_be_bytes(data[32..40].try_into().ok()?);
    let transmit = u64::from_be_bytes(data[40..48].try_into().ok()?);
    if transmit == 0 {
        return None;
    }

    Some(ServerReply {
        stratum,
        receive: ntp_to_unix(receive),
        transmit: ntp_to_unix(transmit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use horologion_core::FixedClock;

    fn server_reply(originate: u64, receive: u64, transmit: u64, stratum: u8) -> [u8; 48] {
        let mut packet = [0u8; 48];
        packet[0] = 0x24; // LI=0, VN=4, Mode=4
        packet[1] = stratum;
        packet[24..32].copy_from_slice(&originate.to_be_bytes());
        packet[32..40].copy_from_slice(&receive.to_be_bytes());
        packet[40..48].copy_from_slice(&transmit.to_be_bytes());
        packet
    }

    #[test]
    fn test_build_request_header() {
        let request = build_request(0x1234_5678_9abc_def0);
        assert_eq!(request.len(), NTP_PACKET_SIZE);
        assert_eq!(request[0], 0x23); // VN=4, Mode=3
        assert_eq!(request[1], 0); // stratum unspecified
        assert_eq!(&request[40..48], &0x1234_5678_9abc_def0u64.to_be_bytes());
    }

    #[test]
    fn test_timestamp_conversion_roundtrip() {
        for micros in [0i64, 1, 999_999, 1_704_067_200_000_000, -1_000_000] {
            let back = ntp_to_unix(unix_to_ntp(UtcInstant::from_micros(micros)));
            assert!(
                (back.as_micros() - micros).abs() <= 1,
                "micros {micros} -> {}",
                back.as_micros()
            );
        }
    }

    #[test]
    fn test_ntp_era_offset() {
        // Unix epoch is 2,208,988,800 seconds into the NTP era
        let ntp = unix_to_ntp(UtcInstant::from_micros(0));
        assert_eq!(ntp >> 32, NTP_UNIX_OFFSET_SECS);
        assert_eq!(ntp & 0xFFFF_FFFF, 0);
    }

    #[test]
    fn test_parse_reply_accepts_valid() {
        let originate = unix_to_ntp(UtcInstant::from_secs(1_704_067_200));
        let receive = unix_to_ntp(UtcInstant::from_secs(1_704_067_201));
        let transmit = unix_to_ntp(UtcInstant::from_secs(1_704_067_202));
        let reply = parse_reply(&server_reply(originate, receive, transmit, 2), originate)
            .expect("valid reply");
        assert_eq!(reply.stratum, 2);
        assert_eq!(reply.receive.as_secs_f64() as i64, 1_704_067_201);
    }

    #[test]
    fn test_parse_reply_rejects_bad_packets() {
        let originate = unix_to_ntp(UtcInstant::from_secs(1_704_067_200));
        let good = server_reply(originate, originate, originate, 2);

        // Truncated
        assert!(parse_reply(&good[..40], originate).is_none());

        // Wrong mode (client)
        let mut bad = good;
        bad[0] = 0x23;
        assert!(parse_reply(&bad, originate).is_none());

        // Kiss-of-death stratum
        let mut bad = good;
        bad[1] = 0;
        assert!(parse_reply(&bad, originate).is_none());

        // Originate mismatch (spoofed or stale reply)
        assert!(parse_reply(&good, originate + 1).is_none());

        // Zero transmit timestamp
        let mut bad = good;
        bad[40..48].copy_from_slice(&0u64.to_be_bytes());
        assert!(parse_reply(&bad, originate).is_none());
    }

    #[test]
    fn test_offset_and_delay_computation() {
        // Local clock 500ms behind the server, 40ms symmetric path
        let t1 = UtcInstant::from_micros(1_000_000);
        let t2 = UtcInstant::from_micros(1_520_000); // +500ms offset, +20ms path
        let t3 = UtcInstant::from_micros(1_530_000);
        let t4 = UtcInstant::from_micros(1_050_000);
        let reply = ServerReply {
            stratum: 2,
            receive: t2,
            transmit: t3,
        };
        let sample = sample_from("test", &reply, t1, t4);
        assert_eq!(sample.offset.as_micros(), 500_000);
        assert_eq!(sample.round_trip, Duration::from_micros(40_000));
    }

    #[tokio::test]
    async fn test_query_against_local_responder() {
        // Loopback SNTP responder applying a fixed +250ms offset
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = responder.local_addr().unwrap();
        let offset_micros = 250_000i64;

        tokio::spawn(async move {
            let mut buf = [0u8; 48];
            let (len, from) = responder.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 48);
            let originate = u64::from_be_bytes(buf[40..48].try_into().unwrap());
            let client_t1 = ntp_to_unix(originate);
            let server_now = unix_to_ntp(UtcInstant::from_micros(
                client_t1.as_micros() + offset_micros,
            ));
            let reply = server_reply(originate, server_now, server_now, 2);
            responder.send_to(&reply, from).await.unwrap();
        });

        let clock = FixedClock::new(UtcInstant::from_secs(1_704_067_200));
        let client = NtpClient::with_timeout(Duration::from_secs(2));
        let sample = client
            .query_addr("local", addr, &clock)
            .await
            .expect("local exchange");

        // Fixed clock makes T4 == T1; the randomized transmit
        // fraction leaves a few microseconds of slack
        assert!(
            (sample.offset.as_micros() - offset_micros).abs() <= 20,
            "offset {:?}",
            sample.offset
        );
        assert_eq!(sample.stratum, 2);
    }

    #[tokio::test]
    async fn test_empty_server_list() {
        let clock = FixedClock::new(UtcInstant::from_secs(0));
        let err = NtpClient::new().query_any(&[], &clock).await.unwrap_err();
        assert!(matches!(err, HorologionError::NoServerReachable));
    }
}
